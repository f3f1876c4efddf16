mod common;

use std::collections::BTreeMap;

use common::{articles_db, articles_schema, find, save, strategy};
use localerow::prelude::*;

fn read_one(
    db: &common::MemoryDatabase,
    strategy: &mut TranslateStrategy,
    id: &Value,
) -> Row {
    let mut query = Select::new("articles");
    query.filter(Expr::eq("id", id.clone()));
    let (_, mut rows) = find(db, strategy, query, &FindOptions::new()).expect("find");
    assert_eq!(rows.len(), 1);
    rows.remove(0)
}

#[test]
fn save_then_read_round_trip() {
    let schema = articles_schema();
    let mut db = articles_db(&schema);
    let mut strategy = strategy(&schema, TranslateConfig::new(), "fr");

    let mut article = Entity::new("articles").with("published", true).with("title", "Bonjour");
    let outcome = save(&mut db, &strategy, &mut article).expect("save");
    assert_eq!(outcome, SaveOutcome::Staged { created: true });
    assert!(!article.has("_i18n"));
    assert!(!article.is_new());

    let id = article.value("id").cloned().expect("id assigned");
    assert_eq!(
        db.find_row("articles", &[("id", id.clone())])
            .and_then(|r| r.get("title")),
        Some(&Value::Null)
    );

    let french = read_one(&db, &mut strategy, &id);
    assert_eq!(french.text("title"), Some("Bonjour"));
    assert_eq!(french.text("_locale"), Some("fr"));

    strategy.set_locale(Some("en".to_string()));
    let english = read_one(&db, &mut strategy, &id);
    assert_eq!(english.value("title"), Some(&Value::Null));
    assert_eq!(english.text("_locale"), Some("en"));
}

#[test]
fn saving_the_same_locale_twice_updates_one_row() {
    let schema = articles_schema();
    let mut db = articles_db(&schema);
    let strategy = strategy(&schema, TranslateConfig::new(), "fr");

    let mut article = Entity::new("articles").with("published", true).with("title", "Bonjour");
    save(&mut db, &strategy, &mut article).expect("first save");

    article.set("title", "Salut");
    let outcome = save(&mut db, &strategy, &mut article).expect("second save");
    assert_eq!(outcome, SaveOutcome::Staged { created: false });

    let translations = db.rows("articles_translations");
    assert_eq!(translations.len(), 1);
    assert_eq!(translations[0]["title"], Value::from("Salut"));
    assert_eq!(translations[0]["locale"], Value::from("fr"));
}

#[test]
fn default_locale_writes_the_main_row() {
    let schema = articles_schema();
    let mut db = articles_db(&schema);
    let strategy = strategy(&schema, TranslateConfig::new(), "en_US");

    let mut article = Entity::new("articles").with("published", true).with("title", "Hello");
    let outcome = save(&mut db, &strategy, &mut article).expect("save");

    assert_eq!(outcome, SaveOutcome::DefaultLocale);
    assert_eq!(db.rows("articles")[0]["title"], Value::from("Hello"));
    assert!(db.rows("articles_translations").is_empty());
}

#[test]
fn entity_locale_wins_over_pinned_locale() {
    let schema = articles_schema();
    let mut db = articles_db(&schema);
    let strategy = strategy(&schema, TranslateConfig::new(), "fr");

    let mut article = Entity::new("articles")
        .with("published", true)
        .with("title", "Hallo")
        .with("_locale", "de");
    save(&mut db, &strategy, &mut article).expect("save");

    let translations = db.rows("articles_translations");
    assert_eq!(translations.len(), 1);
    assert_eq!(translations[0]["locale"], Value::from("de"));
    assert_eq!(article.text("_locale"), Some("de"));
}

#[test]
fn multi_locale_payload_on_insert() {
    let schema = articles_schema();
    let mut db = articles_db(&schema);
    let strategy = strategy(&schema, TranslateConfig::new(), "en_US");

    let mut article = Entity::new("articles").with("published", true);
    strategy
        .marshal_translations(
            &mut article,
            &serde_json::json!({"_translations": {
                "fr": {"title": "Bonjour", "body": "Corps"},
                "de": {"title": "Hallo"}
            }}),
            &MarshalOptions::default(),
        )
        .expect("marshal");

    let outcome = save(&mut db, &strategy, &mut article).expect("save");
    assert_eq!(outcome, SaveOutcome::DeferredUntilInsert);

    let id = article.value("id").cloned().expect("id assigned");
    let translations = db.rows("articles_translations");
    assert_eq!(translations.len(), 2);
    assert!(translations.iter().all(|t| t["id"] == id));
    let fr = db
        .find_row("articles_translations", &[("id", id.clone()), ("locale", Value::from("fr"))])
        .expect("french row");
    assert_eq!(fr["body"], Value::from("Corps"));
}

#[test]
fn empty_locales_are_not_persisted() {
    let schema = articles_schema();
    let mut db = articles_db(&schema);
    db.insert(
        "articles",
        [("id", Value::BigInt(5)), ("published", Value::Bool(true))],
    );
    let strategy = strategy(
        &schema,
        TranslateConfig::new().allow_empty_translations(false),
        "en_US",
    );

    let mut article = Entity::hydrate("articles", [("id", Value::BigInt(5))]);
    strategy
        .marshal_translations(
            &mut article,
            &serde_json::json!({"_translations": {
                "fr": {"title": "Bonjour", "body": ""},
                "de": {"title": "", "body": ""}
            }}),
            &MarshalOptions::default(),
        )
        .expect("marshal");

    save(&mut db, &strategy, &mut article).expect("save");

    let translations = db.rows("articles_translations");
    assert_eq!(translations.len(), 1);
    assert_eq!(translations[0]["locale"], Value::from("fr"));
    assert_eq!(translations[0]["body"], Value::Null);
    assert!(
        db.find_row("articles_translations", &[("id", Value::BigInt(5)), ("locale", Value::from("de"))])
            .is_none()
    );
}

#[test]
fn inline_values_with_payload_keep_only_the_payload() {
    let schema = articles_schema();
    let mut db = articles_db(&schema);
    db.insert(
        "articles",
        [("id", Value::BigInt(9)), ("title", Value::from("Hello"))],
    );
    let strategy = strategy(&schema, TranslateConfig::new(), "fr");

    let payload = BTreeMap::from([(
        "de".to_string(),
        Row::Entity(Entity::new("articles_translations").with("title", "Hallo")),
    )]);
    let mut article = Entity::hydrate("articles", [("id", Value::BigInt(9))])
        .with("title", "Bonjour")
        .with("_translations", payload);

    let outcome = save(&mut db, &strategy, &mut article).expect("save");
    assert_eq!(outcome, SaveOutcome::AmbiguousPayload);

    let translations = db.rows("articles_translations");
    assert_eq!(translations.len(), 1);
    assert_eq!(translations[0]["locale"], Value::from("de"));
    assert_eq!(db.rows("articles")[0]["title"], Value::from("Bonjour"));
}

#[test]
fn persistence_failure_surfaces_unchanged() {
    let schema = articles_schema();
    let mut db = common::MemoryDatabase::new(&schema, &["articles"]);
    let strategy = strategy(&schema, TranslateConfig::new(), "fr");

    let mut article = Entity::hydrate("articles", [("id", Value::BigInt(1))]).with("title", "Bonjour");
    let err = save(&mut db, &strategy, &mut article).expect_err("translations table missing");
    assert_eq!(err, Error::UnknownTable("articles_translations".to_string()));
}
