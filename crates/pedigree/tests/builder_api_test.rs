//! Integration tests for the PedigreeBuilder API
//!
//! These tests walk the public pipeline from a record store to a laid out
//! scene.

use std::cell::Cell;

use pedigree::{
    FetchError, PedigreeBuilder, PedigreeError,
    config::{AppConfig, ExpansionConfig, LayoutConfig, SourceConfig},
    expand::{Expander, Termination},
    identifier::Id,
    layout::{NodeKind, Scene},
    query::Filter,
    rebuild::Session,
    record::{DiagnosticKind, RawRecord},
    source::{MemoryStore, RelationSource, SourceContext},
    structure::{EdgeKind, NodeKey},
};

fn build(records: &[RawRecord]) -> pedigree::Pedigree {
    PedigreeBuilder::default()
        .build(records, &Filter::new())
        .expect("Failed to build pedigree")
}

fn count_edges(pedigree: &pedigree::Pedigree, kind: EdgeKind) -> usize {
    pedigree
        .graph()
        .edges()
        .filter(|edge| edge.kind() == kind)
        .count()
}

#[test]
fn test_scenario_a_single_union() {
    let pedigree = build(&[
        RawRecord::new("sa-s", "S", "dog").with_gender("male"),
        RawRecord::new("sa-d", "D", "dog").with_gender("female"),
        RawRecord::new("sa-x", "X", "dog").with_sire("sa-s").with_dam("sa-d"),
    ]);

    assert_eq!(pedigree.graph().unions().count(), 1);
    assert_eq!(count_edges(&pedigree, EdgeKind::Partner), 2);
    assert_eq!(count_edges(&pedigree, EdgeKind::Parent), 1);

    let child_edge = pedigree
        .graph()
        .edges()
        .find(|edge| edge.kind() == EdgeKind::Parent)
        .expect("child edge");
    assert!(matches!(child_edge.source(), NodeKey::Union(_)));
    assert_eq!(child_edge.target(), NodeKey::Individual(Id::new("sa-x")));
}

#[test]
fn test_scenario_b_single_parent() {
    let pedigree = build(&[
        RawRecord::new("sb-s", "S", "dog"),
        RawRecord::new("sb-x", "X", "dog").with_sire("sb-s"),
    ]);

    assert_eq!(pedigree.graph().unions().count(), 0);
    let edges: Vec<_> = pedigree.graph().edges().collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source(), NodeKey::Individual(Id::new("sb-s")));
    assert_eq!(edges[0].target(), NodeKey::Individual(Id::new("sb-x")));
}

#[test]
fn test_scenario_c_shared_pair() {
    let pedigree = build(&[
        RawRecord::new("sc-x", "X", "cat").with_sire("sc-s").with_dam("sc-d"),
        RawRecord::new("sc-y", "Y", "cat").with_sire("sc-s").with_dam("sc-d"),
        RawRecord::new("sc-s", "S", "cat"),
        RawRecord::new("sc-d", "D", "cat"),
    ]);

    assert_eq!(pedigree.graph().unions().count(), 1);
    let union = pedigree.graph().unions().next().expect("one union");
    assert_eq!(union.children().len(), 2);
    assert_eq!(count_edges(&pedigree, EdgeKind::Parent), 2);
}

/// Answers every round with records the caller already knows.
struct EchoSource {
    rounds: Cell<usize>,
}

impl RelationSource for EchoSource {
    fn list_owned(&self, _context: &SourceContext) -> Result<Vec<RawRecord>, FetchError> {
        Ok(vec![
            RawRecord::new("sd-a", "A", "goat"),
            RawRecord::new("sd-b", "B", "goat").with_sire("sd-a"),
        ])
    }

    fn expand(&self, _context: &SourceContext, _ids: &[Id]) -> Result<Vec<RawRecord>, FetchError> {
        self.rounds.set(self.rounds.get() + 1);
        Ok(vec![RawRecord::new("sd-a", "A again", "goat")])
    }
}

#[test]
fn test_scenario_d_round_without_news_halts() {
    let source = EchoSource {
        rounds: Cell::new(0),
    };
    let expansion = PedigreeBuilder::default()
        .collect(&source)
        .expect("owned records listed");

    assert_eq!(expansion.termination(), &Termination::Converged);
    assert_eq!(expansion.rounds(), 1);
    assert_eq!(source.rounds.get(), 1);

    let names: Vec<_> = expansion
        .records()
        .iter()
        .filter_map(|record| record.name.as_deref())
        .collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_scenario_e_filter_to_single_orphan() {
    let records = vec![
        RawRecord::new("se-sire", "Thunder", "horse"),
        RawRecord::new("se-x", "Lightning", "horse").with_sire("se-sire"),
    ];
    let pedigree = PedigreeBuilder::default()
        .build(&records, &Filter::new().with_text("lightning"))
        .expect("Failed to build pedigree");

    let layout = pedigree.scene().layout().expect("one node to show");
    assert_eq!(layout.nodes().len(), 1);
    assert!(layout.edges().is_empty());
    assert_eq!(layout.nodes()[0].kind(), NodeKind::Individual);
}

#[test]
fn test_filter_without_matches_is_empty_scene() {
    let records = vec![RawRecord::new("nm-1", "One", "rabbit")];
    let pedigree = PedigreeBuilder::default()
        .build(&records, &Filter::new().with_species("ferret"))
        .expect("Failed to build pedigree");

    assert!(matches!(pedigree.scene(), Scene::Empty));
    assert!(pedigree.diagnostics().is_empty());
}

#[test]
fn test_load_from_memory_store() {
    let store = MemoryStore::from_json(
        r#"{
            "owned": [{ "id": "ms-pup", "name": "Pup", "species": "dog", "sireId": "ms-sire", "damId": "ms-dam" }],
            "records": [
                { "id": "ms-sire", "name": "Sire", "species": "dog", "sex": "male", "sire": "ms-grandsire" },
                { "id": "ms-dam", "name": "Dam", "species": "dog", "gender": "female" },
                { "id": "ms-grandsire", "name": "Old", "species": "dog" },
                { "id": "ms-stranger", "name": "Stranger", "species": "dog" }
            ]
        }"#,
    )
    .expect("valid store");

    let pedigree = PedigreeBuilder::default()
        .load(&store, &Filter::new())
        .expect("Failed to load pedigree");
    let graph = pedigree.graph();

    assert_eq!(graph.individuals().count(), 4);
    assert!(graph.individual(Id::new("ms-stranger")).is_none());
    assert!(graph.individual(Id::new("ms-pup")).expect("pup").is_owned());
    assert!(!graph.individual(Id::new("ms-sire")).expect("sire").is_owned());

    let detail = pedigree.detail(Id::new("ms-pup")).expect("detail");
    assert_eq!(
        detail.paternal_grandsire().map(|individual| individual.name()),
        Some("Old")
    );
}

/// Refuses every call.
struct DownSource;

impl RelationSource for DownSource {
    fn list_owned(&self, _context: &SourceContext) -> Result<Vec<RawRecord>, FetchError> {
        Err(FetchError::Unavailable("maintenance".to_string()))
    }

    fn expand(&self, _context: &SourceContext, _ids: &[Id]) -> Result<Vec<RawRecord>, FetchError> {
        Err(FetchError::Unavailable("maintenance".to_string()))
    }
}

#[test]
fn test_failed_initial_load_is_an_error() {
    let result = PedigreeBuilder::default().load(&DownSource, &Filter::new());

    assert!(matches!(
        result,
        Err(PedigreeError::Fetch(FetchError::Unavailable(_)))
    ));
}

#[test]
fn test_failed_expansion_keeps_owned_set() {
    let context = SourceContext::from(&SourceConfig::default());
    let expansion = Expander::new(&DownSource, context, &ExpansionConfig::default())
        .expand(vec![RawRecord::new("fx-own", "Own", "pig")]);

    assert!(matches!(
        expansion.termination(),
        Termination::Interrupted(FetchError::Unavailable(_))
    ));
    assert_eq!(expansion.records().len(), 1);
}

#[test]
fn test_diagnostics_are_reported_not_fatal() {
    let pedigree = build(&[
        RawRecord::new("dg-ok", "Fine", "cat"),
        RawRecord::new("dg-same", "Same", "cat")
            .with_sire("dg-ok")
            .with_dam("dg-ok"),
        serde_json::from_str::<RawRecord>(r#"{"name": "No id", "species": "cat"}"#)
            .expect("loose record"),
    ]);

    let kinds: Vec<_> = pedigree.diagnostics().iter().map(|d| d.kind()).collect();
    assert!(kinds.contains(&DiagnosticKind::SameSireAndDam));
    assert!(kinds.contains(&DiagnosticKind::MissingId));
    assert_eq!(pedigree.graph().individuals().count(), 2);
    assert_eq!(pedigree.graph().edges().count(), 0);
}

#[test]
fn test_custom_layout_spacing() {
    let config = AppConfig::new(
        SourceConfig::default(),
        ExpansionConfig::default(),
        LayoutConfig::new(200.0, 100.0, 150.0, 8),
    );
    let pedigree = PedigreeBuilder::new(config)
        .build(
            &[
                RawRecord::new("cs-s", "S", "dog"),
                RawRecord::new("cs-d", "D", "dog"),
                RawRecord::new("cs-x", "X", "dog").with_sire("cs-s").with_dam("cs-d"),
            ],
            &Filter::new(),
        )
        .expect("Failed to build pedigree");
    let layout = pedigree.scene().layout().expect("laid out");

    let sire = layout.position(Id::new("cs-s")).expect("placed");
    let dam = layout.position(Id::new("cs-d")).expect("placed");
    let child = layout.position(Id::new("cs-x")).expect("placed");
    assert!((sire.x() - dam.x()).abs() >= 150.0);
    assert_eq!(sire.y(), dam.y());
    assert_eq!(child.y(), 100.0);
}

#[test]
fn test_session_publishes_latest_only() {
    let mut session = Session::new();
    let first = session.begin();
    let second = session.begin();

    assert!(!session.publish(first, build(&[RawRecord::new("ss-1", "1", "dog")])));
    assert!(session.publish(second, build(&[RawRecord::new("ss-2", "2", "dog")])));
    assert!(session.select(Id::new("ss-2")));
    assert!(!session.select(Id::new("ss-1")));
}
