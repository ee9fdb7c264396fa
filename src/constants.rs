/// Selector and column constants shared by the singer crawler and normalizer.
/// Labels are the French ones observed on the source site.

// Crawl entry point
pub const SINGERS_CATEGORY_URL: &str =
    "https://fr.wikipedia.org/wiki/Cat%C3%A9gorie:Auteur-compositeur-interpr%C3%A8te_fran%C3%A7ais";

pub const DEFAULT_USER_AGENT: &str = concat!("blindtest/", env!("CARGO_PKG_VERSION"));

// Index page markup
pub const CATEGORY_ANCHOR_SELECTOR: &str = "div.mw-category-group li a";
pub const NEXT_PAGE_TEXT: &str = "page suivante";

// Detail page markup
pub const INFOBOX_ROW_SELECTOR: &str = "div.infobox.infobox_v3 table tr";
pub const INFOBOX_HEADER_SELECTOR: &str = "th";
pub const INFOBOX_DATA_SELECTOR: &str = "td";

// Raw record labels
pub const NAME_FIELD: &str = "name";
pub const BIRTH_NAME_FIELD: &str = "Nom de naissance";
pub const BIRTH_FIELD: &str = "Naissance";
pub const DEATH_FIELD: &str = "Décès";
pub const PRIMARY_ACTIVITY_FIELD: &str = "Activité principale";
pub const GENRE_FIELD: &str = "Genre musical";
pub const NATIONALITY_FIELD: &str = "Nationalité";
pub const INSTRUMENTS_FIELD: &str = "Instruments";
pub const ACTIVE_YEARS_FIELD: &str = "Années actives";
pub const LABELS_FIELD: &str = "Labels";
pub const ACTIVITY_PERIOD_FIELD: &str = "Période d'activité";

/// Raw columns kept by the projection step
pub const PROJECTED_FIELDS: [&str; 11] = [
    NAME_FIELD,
    BIRTH_NAME_FIELD,
    BIRTH_FIELD,
    PRIMARY_ACTIVITY_FIELD,
    GENRE_FIELD,
    NATIONALITY_FIELD,
    INSTRUMENTS_FIELD,
    ACTIVE_YEARS_FIELD,
    DEATH_FIELD,
    LABELS_FIELD,
    ACTIVITY_PERIOD_FIELD,
];

/// Free-text columns canonicalized by the normalizer
pub const FREE_TEXT_FIELDS: [&str; 7] = [
    PRIMARY_ACTIVITY_FIELD,
    INSTRUMENTS_FIELD,
    GENRE_FIELD,
    LABELS_FIELD,
    NATIONALITY_FIELD,
    ACTIVE_YEARS_FIELD,
    ACTIVITY_PERIOD_FIELD,
];

/// Output table header, in column order
pub const CLEAN_COLUMNS: [&str; 13] = [
    "Nom connu",
    "Nom de naissance",
    "Date de Naissance",
    "Année de Naissance",
    "Date de Décès",
    "Année de Décès",
    "Activité principale",
    "Genre musical",
    "Nationalité",
    "Instruments",
    "Années actives",
    "Labels",
    "Période d'activité",
];

pub const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Zero-padded month code for a French month name
pub fn month_code(month: &str) -> Option<String> {
    FRENCH_MONTHS
        .iter()
        .position(|m| *m == month)
        .map(|idx| format!("{:02}", idx + 1))
}
