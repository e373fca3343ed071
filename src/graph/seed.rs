//! Built-in physics concept bank and resolver keyword table.
//!
//! This is static reference data, shipped with the crate the same way the
//! question banks ship with the tutoring app. The keyword table is declared
//! in graph order; that order doubles as the resolver's tie-break priority.

use crate::graph::{GraphError, KnowledgeGraph};
use crate::resolver::ConceptKeywords;
use crate::types::{
    ConceptCategory, ConceptDifficulty, ConceptEdge, ConceptNode, RelationshipKind,
};

fn node(
    id: &str,
    name: &str,
    category: ConceptCategory,
    difficulty: ConceptDifficulty,
    prerequisites: &[&str],
) -> ConceptNode {
    ConceptNode {
        id: id.to_string(),
        name: name.to_string(),
        category,
        difficulty,
        prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
    }
}

fn edge(source: &str, target: &str, relationship: RelationshipKind, strength: f64) -> ConceptEdge {
    ConceptEdge {
        source: source.to_string(),
        target: target.to_string(),
        relationship,
        strength,
    }
}

/// The default high-school/intro-physics concept graph.
pub fn physics_graph() -> Result<KnowledgeGraph, GraphError> {
    use ConceptCategory::*;
    use ConceptDifficulty::*;

    let nodes = vec![
        node("vectors", "Vectors", Mechanics, Basic, &[]),
        node("kinematics", "Kinematics", Mechanics, Basic, &["vectors"]),
        node("newtons-laws", "Newton's Laws", Mechanics, Basic, &["kinematics"]),
        node("friction", "Friction", Mechanics, Intermediate, &["newtons-laws"]),
        node(
            "circular-motion",
            "Circular Motion",
            Mechanics,
            Intermediate,
            &["newtons-laws", "vectors"],
        ),
        node(
            "gravitation",
            "Universal Gravitation",
            Mechanics,
            Intermediate,
            &["circular-motion"],
        ),
        node(
            "work-energy",
            "Work and Energy",
            Mechanics,
            Intermediate,
            &["newtons-laws"],
        ),
        node("momentum", "Momentum", Mechanics, Intermediate, &["newtons-laws"]),
        node(
            "rotational-dynamics",
            "Rotational Dynamics",
            Mechanics,
            Advanced,
            &["circular-motion", "momentum"],
        ),
        node(
            "simple-harmonic-motion",
            "Simple Harmonic Motion",
            Waves,
            Intermediate,
            &["work-energy"],
        ),
        node(
            "mechanical-waves",
            "Mechanical Waves",
            Waves,
            Intermediate,
            &["simple-harmonic-motion"],
        ),
        node("sound", "Sound", Waves, Intermediate, &["mechanical-waves"]),
        node("thermal-energy", "Thermal Energy", Thermodynamics, Basic, &[]),
        node(
            "laws-of-thermodynamics",
            "Laws of Thermodynamics",
            Thermodynamics,
            Advanced,
            &["thermal-energy", "work-energy"],
        ),
        node(
            "electrostatics",
            "Electrostatics",
            Electromagnetism,
            Intermediate,
            &["vectors"],
        ),
        node("circuits", "Circuits", Electromagnetism, Intermediate, &["electrostatics"]),
        node(
            "magnetism",
            "Magnetism",
            Electromagnetism,
            Advanced,
            &["circuits", "vectors"],
        ),
        node(
            "geometric-optics",
            "Geometric Optics",
            Optics,
            Intermediate,
            &["mechanical-waves"],
        ),
    ];

    let edges = vec![
        edge("vectors", "kinematics", RelationshipKind::Prerequisite, 1.0),
        edge("kinematics", "newtons-laws", RelationshipKind::Prerequisite, 1.0),
        edge("newtons-laws", "friction", RelationshipKind::Prerequisite, 0.9),
        edge("newtons-laws", "circular-motion", RelationshipKind::Prerequisite, 0.9),
        edge("newtons-laws", "work-energy", RelationshipKind::Prerequisite, 0.8),
        edge("newtons-laws", "momentum", RelationshipKind::Prerequisite, 0.8),
        edge("circular-motion", "gravitation", RelationshipKind::Prerequisite, 0.9),
        edge("work-energy", "momentum", RelationshipKind::Related, 0.7),
        edge("momentum", "rotational-dynamics", RelationshipKind::BuildsOn, 0.8),
        edge("work-energy", "simple-harmonic-motion", RelationshipKind::BuildsOn, 0.7),
        edge("simple-harmonic-motion", "mechanical-waves", RelationshipKind::BuildsOn, 0.9),
        edge("mechanical-waves", "sound", RelationshipKind::AppliesTo, 0.8),
        edge("work-energy", "laws-of-thermodynamics", RelationshipKind::BuildsOn, 0.6),
        edge("electrostatics", "circuits", RelationshipKind::Prerequisite, 0.9),
        edge("vectors", "electrostatics", RelationshipKind::AppliesTo, 0.6),
        edge("circuits", "magnetism", RelationshipKind::BuildsOn, 0.7),
        edge("gravitation", "electrostatics", RelationshipKind::Related, 0.5),
        edge("mechanical-waves", "geometric-optics", RelationshipKind::Related, 0.5),
    ];

    KnowledgeGraph::build(nodes, edges)
}

/// Curated keyword sets for fuzzy concept resolution, in priority order.
pub fn keyword_table() -> Vec<ConceptKeywords> {
    let table: &[(&str, &[&str])] = &[
        ("vectors", &["vector", "component", "magnitude", "direction", "resultant"]),
        (
            "kinematics",
            &["kinematics", "velocity", "acceleration", "displacement", "projectile", "free fall"],
        ),
        (
            "newtons-laws",
            &["newton", "force", "inertia", "action reaction", "net force", "second law"],
        ),
        ("friction", &["friction", "normal force", "incline", "static", "kinetic"]),
        (
            "circular-motion",
            &["circular", "centripetal", "uniform circular", "angular velocity", "radius"],
        ),
        ("gravitation", &["gravity", "gravitation", "orbit", "satellite", "kepler"]),
        (
            "work-energy",
            &["work", "energy", "kinetic energy", "potential energy", "conservation of energy", "power"],
        ),
        (
            "momentum",
            &["momentum", "impulse", "collision", "conservation of momentum", "elastic", "inelastic"],
        ),
        (
            "rotational-dynamics",
            &["torque", "rotational", "moment of inertia", "angular momentum"],
        ),
        (
            "simple-harmonic-motion",
            &["harmonic", "oscillation", "pendulum", "spring", "amplitude", "period"],
        ),
        (
            "mechanical-waves",
            &["wave", "wavelength", "frequency", "interference", "standing wave", "superposition"],
        ),
        ("sound", &["sound", "doppler", "pitch", "resonance", "decibel"]),
        ("thermal-energy", &["heat", "temperature", "thermal", "specific heat", "calorimetry"]),
        (
            "laws-of-thermodynamics",
            &["thermodynamics", "entropy", "first law", "second law of thermodynamics", "heat engine"],
        ),
        (
            "electrostatics",
            &["charge", "electric field", "coulomb", "electrostatic", "electric potential"],
        ),
        ("circuits", &["circuit", "current", "resistance", "voltage", "ohm", "capacitor"]),
        ("magnetism", &["magnet", "magnetic field", "induction", "flux", "solenoid"]),
        (
            "geometric-optics",
            &["optics", "lens", "mirror", "refraction", "reflection", "image"],
        ),
    ];

    table
        .iter()
        .map(|(concept_id, keywords)| ConceptKeywords {
            concept_id: concept_id.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}
