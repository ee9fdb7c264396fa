use anyhow::Result;
use blindtest::app::singers_use_case::SingersUseCase;
use blindtest::error::ScraperError;
use blindtest::pipeline::csv_out::read_table;
use serde_json::json;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_clean_writes_table_in_input_order() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("singers.json");
    let dest = dir.path().join("out").join("singers.csv");
    let raw = json!([
        {
            "name": "Zaz (chanteuse)",
            "Nom de naissance": "Isabelle Geffroy",
            "Naissance": "1er mai 1980 Tours",
            "Genre musical": "Chanson française ,  Jazz manouche",
            "Labels": "Play On"
        },
        {
            "name": "Édith Piaf",
            "Naissance": "19 décembre 1915",
            "Décès": "10 octobre 1963 (à 47 ans)",
            "Nationalité": "Française",
            "Années actives": "1935 – 1963"
        },
        { "name": "Inconnu", "Instruments": null }
    ]);
    fs::write(&source, serde_json::to_string_pretty(&raw)?)?;

    let rows = SingersUseCase::clean(&source, &dest)?;
    assert_eq!(rows, 3);

    let table = read_table(&dest)?;
    assert_eq!(table.len(), 3);

    let zaz = &table[0];
    assert_eq!(zaz.known_name, "Zaz");
    assert_eq!(zaz.legal_name, "Isabelle Geffroy");
    // "1er" is not a day number followed by a month
    assert_eq!(zaz.birth_date, None);
    assert_eq!(zaz.birth_year, Some(1980.0));
    assert_eq!(zaz.musical_genre.as_deref(), Some("chanson francaise, jazz manouche"));
    assert_eq!(zaz.labels.as_deref(), Some("play on"));

    let piaf = &table[1];
    assert_eq!(piaf.known_name, "Édith Piaf");
    assert_eq!(piaf.legal_name, "Édith Piaf");
    assert_eq!(piaf.birth_date.as_deref(), Some("1915-12-19"));
    assert_eq!(piaf.death_date.as_deref(), Some("1963-10-10"));
    assert_eq!(piaf.death_year, Some(1963.0));
    assert_eq!(piaf.nationality.as_deref(), Some("francaise"));
    assert_eq!(piaf.active_years.as_deref(), Some("1935 - 1963"));

    let unknown = &table[2];
    assert_eq!(unknown.known_name, "Inconnu");
    assert_eq!(unknown.instruments, None);
    assert_eq!(unknown.birth_year, None);
    Ok(())
}

#[test]
fn test_clean_years_are_written_as_floats() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("raw.json");
    let dest = dir.path().join("table.csv");
    fs::write(&source, r#"[{"name": "Barbara", "Naissance": "6 juin 1930"}]"#)?;

    SingersUseCase::clean(&source, &dest)?;

    let content = fs::read_to_string(&dest)?;
    let mut lines = content.lines();
    assert!(lines.next().is_some_and(|h| h.starts_with("Nom connu,Nom de naissance,")));
    assert_eq!(lines.next(), Some("Barbara,Barbara,1930-06-6,1930.0,,,,,,,,,"));
    assert_eq!(lines.next(), None);
    Ok(())
}

#[test]
fn test_clean_missing_source_is_an_error() {
    let dir = tempdir().unwrap();
    let result = SingersUseCase::clean(&dir.path().join("absent.json"), &dir.path().join("out.csv"));
    assert!(matches!(result, Err(ScraperError::Io(_))));
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn test_clean_skips_records_without_usable_name() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("raw.json");
    let dest = dir.path().join("out.csv");
    let raw = json!([
        { "name": "Barbara", "Labels": "Philips" },
        { "Labels": "Vogue" },
        { "name": "(homonymie)" },
        { "name": "" },
        { "name": "Zaz (chanteuse)" }
    ]);
    fs::write(&source, raw.to_string())?;

    let rows = SingersUseCase::clean(&source, &dest)?;
    assert_eq!(rows, 2);

    let table = read_table(&dest)?;
    let names: Vec<_> = table.iter().map(|r| r.known_name.as_str()).collect();
    assert_eq!(names, vec!["Barbara", "Zaz"]);
    assert_eq!(table[0].labels.as_deref(), Some("philips"));
    Ok(())
}

#[test]
fn test_clean_rejects_input_without_any_name() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("raw.json");
    let dest = dir.path().join("out.csv");
    fs::write(&source, r#"[{"Labels": "Philips"}, {"Labels": "Vogue"}]"#).unwrap();

    let result = SingersUseCase::clean(&source, &dest);
    assert!(matches!(result, Err(ScraperError::MissingField(_))));
    assert!(!dest.exists());
}
