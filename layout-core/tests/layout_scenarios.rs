//! End-to-end designer scenarios on the default 12x4 grid.
//!
//! Each test drives a [`LayoutEngine`] the way the designer does and checks
//! the grid invariants after every step.

use layout_core::{
    CatalogItem, CatalogSnapshot, Category, EngineConfig, FileLayoutStore, GridPosition, GridSize,
    LayoutEngine, LayoutStore, MemoryLayoutStore, OccupancyMap, SectionContent, SectionKind,
    StyleTokens, ThemeApplier,
};

/// Three categories with two items each.
fn three_categories() -> CatalogSnapshot {
    let mut items = Vec::new();
    for (category, names) in [
        ("starters", ["Soup", "Salad"]),
        ("mains", ["Steak", "Salmon"]),
        ("desserts", ["Tart", "Sorbet"]),
    ] {
        for (i, name) in names.iter().enumerate() {
            items.push(CatalogItem::new(format!("{category}-{i}"), category, *name));
        }
    }
    CatalogSnapshot::new(
        vec![
            Category::new("starters", "Starters", 0),
            Category::new("mains", "Mains", 1),
            Category::new("desserts", "Desserts", 2),
        ],
        items,
    )
}

fn engine() -> LayoutEngine<MemoryLayoutStore> {
    LayoutEngine::new(
        layout_core::LayoutConfig::new("dinner"),
        MemoryLayoutStore::new(),
        EngineConfig::default(),
    )
    .expect("engine")
}

/// Rebuild occupancy from scratch and check bounds and exclusivity.
fn assert_grid_valid(engine: &LayoutEngine<MemoryLayoutStore>) {
    let map = OccupancyMap::rebuild(engine.grid(), engine.sections()).expect("in bounds");
    assert!(map.is_consistent(), "conflicts: {:?}", map.conflicts());
    assert_eq!(&map, engine.occupancy());
}

fn promo(text: &str) -> SectionContent {
    SectionContent::text(text)
}

// ===========================================================================
// Placement
// ===========================================================================

#[test]
fn test_promotion_lands_on_target_when_free() {
    let mut engine = engine();
    let id = engine
        .add_section(
            SectionKind::Promotion,
            GridPosition::new(0, 0),
            GridSize::new(1, 2),
            promo("2 for 1"),
        )
        .expect("add");
    assert_eq!(
        engine.section(&id).map(|s| s.position),
        Some(GridPosition::new(0, 0))
    );
    assert_grid_valid(&engine);
}

#[test]
fn test_full_width_block_skips_to_next_free_row() {
    let mut engine = engine();
    engine
        .add_section(
            SectionKind::Promotion,
            GridPosition::new(0, 0),
            GridSize::new(1, 2),
            promo("first"),
        )
        .expect("first");
    let banner = engine
        .add_section(
            SectionKind::Ad,
            GridPosition::new(0, 0),
            GridSize::new(1, 4),
            promo("banner"),
        )
        .expect("banner");
    assert_eq!(
        engine.section(&banner).map(|s| s.position),
        Some(GridPosition::new(1, 0))
    );
    assert_grid_valid(&engine);
}

#[test]
fn test_drag_past_right_edge_is_clamped() {
    let mut engine = engine();
    let id = engine
        .add_section(
            SectionKind::Promotion,
            GridPosition::new(2, 0),
            GridSize::new(1, 2),
            promo("drag me"),
        )
        .expect("add");
    let cell = engine.config().cell;

    // Grab the top-left corner, release over cell (5, 3).
    engine
        .pointer_down(&id, 0.0, 2.0 * cell.height)
        .expect("down");
    engine.pointer_move(3.0 * cell.width + 5.0, 5.0 * cell.height + 5.0);
    let outcome = engine.pointer_up().expect("up").expect("was dragging");

    assert_eq!(outcome.from, GridPosition::new(2, 0));
    assert_eq!(outcome.to, GridPosition::new(5, 2));
    assert_grid_valid(&engine);
}

// ===========================================================================
// Reconciliation
// ===========================================================================

#[test]
fn test_initial_reconcile_creates_header_and_items_per_category() {
    let mut engine = engine();
    let report = engine.reconcile(three_categories()).expect("reconcile");

    assert_eq!(report.added.len(), 6);
    assert!(report.unplaced.is_empty());
    assert_eq!(engine.sections().len(), 6);
    assert_eq!(
        engine
            .sections()
            .iter()
            .filter(|s| s.kind == SectionKind::Category)
            .count(),
        3
    );
    assert_grid_valid(&engine);
}

#[test]
fn test_reconcile_again_keeps_custom_section() {
    let mut engine = engine();
    engine.reconcile(three_categories()).expect("first");
    let promo_id = engine
        .add_section(
            SectionKind::Promotion,
            GridPosition::new(8, 0),
            GridSize::new(1, 2),
            promo("happy hour"),
        )
        .expect("add");
    let before = engine.sections().to_vec();

    let report = engine.reconcile(three_categories()).expect("second");
    assert!(report.is_noop());
    assert_eq!(engine.sections(), before.as_slice());
    assert_eq!(
        engine.section(&promo_id).map(|s| s.position),
        Some(GridPosition::new(8, 0))
    );
    assert_grid_valid(&engine);
}

#[test]
fn test_catalog_changes_do_not_disturb_custom_sections() {
    let mut engine = engine();
    engine.reconcile(three_categories()).expect("first");
    let promo_id = engine
        .add_section(
            SectionKind::Special,
            GridPosition::new(10, 2),
            GridSize::new(2, 2),
            promo("chef's table"),
        )
        .expect("add");
    let promo = engine.section(&promo_id).cloned().expect("promo");

    // Add a category.
    let mut categories = three_categories().categories().to_vec();
    let mut items = three_categories().items().to_vec();
    categories.push(Category::new("drinks", "Drinks", 3));
    items.push(CatalogItem::new("drinks-0", "drinks", "Lemonade"));
    engine
        .reconcile(CatalogSnapshot::new(categories.clone(), items.clone()))
        .expect("with drinks");
    assert_eq!(engine.section(&promo_id), Some(&promo));
    assert_grid_valid(&engine);

    // Remove another one.
    categories.retain(|c| c.id.as_str() != "mains");
    items.retain(|i| i.category_id.as_str() != "mains");
    let report = engine
        .reconcile(CatalogSnapshot::new(categories, items))
        .expect("without mains");
    assert_eq!(report.pruned.len(), 2);
    assert_eq!(engine.section(&promo_id), Some(&promo));
    assert!(engine
        .sections()
        .iter()
        .all(|s| s.category_id.as_ref().map(|c| c.as_str()) != Some("mains")));
    assert_grid_valid(&engine);
}

#[tokio::test]
async fn test_stored_structure_without_canonical_ids_is_not_duplicated() {
    let store = MemoryLayoutStore::new();
    // Empty ids decode to fresh uuids.
    store.insert_raw(
        "dinner",
        r#"{
            "menuKey": "dinner",
            "version": 4,
            "sections": [
                { "id": "", "kind": "category", "categoryId": "mains", "editable": false,
                  "gridPosition": { "row": 0, "col": 0 },
                  "gridSize": { "rowSpan": 1, "colSpan": 4 },
                  "content": { "text": "Mains" } },
                { "id": "", "kind": "items", "categoryId": "mains", "editable": false,
                  "gridPosition": { "row": 1, "col": 0 },
                  "gridSize": { "rowSpan": 1, "colSpan": 4 } },
                { "id": "p", "kind": "promotion", "editable": true,
                  "gridPosition": { "row": 4, "col": 0 },
                  "gridSize": { "rowSpan": 1, "colSpan": 2 } }
            ]
        }"#,
    );
    let mut engine = LayoutEngine::open(store, "dinner", EngineConfig::default())
        .await
        .expect("open");
    let report = engine.reconcile(three_categories()).expect("reconcile");

    assert_eq!(report.added.len(), 4);
    let mains: Vec<_> = engine
        .sections()
        .iter()
        .filter(|s| s.category_id.as_ref().map(|c| c.as_str()) == Some("mains"))
        .map(|s| (s.kind, s.position))
        .collect();
    assert_eq!(
        mains,
        vec![
            (SectionKind::Category, GridPosition::new(0, 0)),
            (SectionKind::Items, GridPosition::new(1, 0)),
        ]
    );
    assert!(engine.reconcile(three_categories()).expect("again").is_noop());
}

// ===========================================================================
// Theme and persistence
// ===========================================================================

#[test]
fn test_theme_changes_style_only() {
    let mut engine = engine();
    engine.reconcile(three_categories()).expect("reconcile");
    engine
        .add_section(
            SectionKind::Ad,
            GridPosition::new(9, 0),
            GridSize::new(1, 4),
            promo("banner"),
        )
        .expect("add");
    let before = engine.sections().to_vec();

    let tokens = StyleTokens {
        primary_color: "#880E4F".to_string(),
        card_color: "#FCE4EC".to_string(),
        border_radius: 0.0,
        ..StyleTokens::default()
    };
    let themed = ThemeApplier::apply(&before, &tokens);
    for (old, new) in before.iter().zip(&themed) {
        assert_eq!(old.id, new.id);
        assert_eq!(old.position, new.position);
        assert_eq!(old.size, new.size);
        assert_eq!(
            old.content.as_ref().map(|c| &c.text),
            new.content.as_ref().map(|c| &c.text)
        );
    }

    engine.set_theme(tokens).expect("set theme");
    assert_eq!(engine.sections(), themed.as_slice());
    assert_grid_valid(&engine);
}

#[tokio::test]
async fn test_file_store_round_trip_is_exact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileLayoutStore::new(dir.path()).expect("store");

    let mut engine = LayoutEngine::open(store.clone(), "dinner", EngineConfig::default())
        .await
        .expect("open");
    engine.reconcile(three_categories()).expect("reconcile");
    engine
        .add_section(
            SectionKind::Promotion,
            GridPosition::new(7, 1),
            GridSize::new(2, 3),
            promo("brunch").with_subtitle("Sundays").with_image("/img/brunch.png"),
        )
        .expect("add");
    engine.set_theme(StyleTokens::default()).expect("theme");
    assert!(engine.flush().await.expect("flush"));

    // Simulates a restart: a fresh store over the same directory.
    let reopened_store = FileLayoutStore::new(dir.path()).expect("store2");
    let loaded = reopened_store
        .load("dinner")
        .await
        .expect("load")
        .expect("exists");
    assert_eq!(&loaded, engine.layout());
}
