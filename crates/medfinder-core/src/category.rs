//! Fixed category catalog
//!
//! The reference site is organized into twelve top-level folders. Each one
//! is a [`Category`] with a display name and a table of filename stems that
//! are probed when the web server offers no directory listing.

use crate::error::{MedfinderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the twelve fixed subject groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Aminosaeuren,
    Harnstoffzyklus,
    Organoazidurien,
    Fettsaeureoxidation,
    Kohlenhydrate,
    LysosomaleSpeicher,
    PeroxisomaleErkrankungen,
    Mitochondriopathien,
    PurinPyrimidin,
    Neurotransmitter,
    VitamineKofaktoren,
    Diagnostik,
}

/// Every category, in catalog order
pub const ALL_CATEGORIES: [Category; 12] = [
    Category::Aminosaeuren,
    Category::Harnstoffzyklus,
    Category::Organoazidurien,
    Category::Fettsaeureoxidation,
    Category::Kohlenhydrate,
    Category::LysosomaleSpeicher,
    Category::PeroxisomaleErkrankungen,
    Category::Mitochondriopathien,
    Category::PurinPyrimidin,
    Category::Neurotransmitter,
    Category::VitamineKofaktoren,
    Category::Diagnostik,
];

/// Filename stems tried in every category folder
pub const GENERIC_CANDIDATES: &[&str] = &[
    "index",
    "overview",
    "uebersicht",
    "summary",
    "zusammenfassung",
    "introduction",
    "einfuehrung",
    "grundlagen",
    "basics",
    "main",
    "start",
    "part1",
    "part2",
    "part3",
    "part4",
    "teil1",
    "teil2",
    "teil3",
    "teil4",
    "teil5",
    "modul1",
    "modul2",
    "modul3",
    "kapitel1",
    "kapitel2",
    "kapitel3",
    "therapie",
    "diagnostik",
    "fallbeispiele",
    "quiz",
];

impl Category {
    /// Stable key, also the folder name on the site
    pub fn key(&self) -> &'static str {
        match self {
            Self::Aminosaeuren => "aminosaeuren",
            Self::Harnstoffzyklus => "harnstoffzyklus",
            Self::Organoazidurien => "organoazidurien",
            Self::Fettsaeureoxidation => "fettsaeureoxidation",
            Self::Kohlenhydrate => "kohlenhydrate",
            Self::LysosomaleSpeicher => "lysosomale_speicher",
            Self::PeroxisomaleErkrankungen => "peroxisomale_erkrankungen",
            Self::Mitochondriopathien => "mitochondriopathien",
            Self::PurinPyrimidin => "purin_pyrimidin",
            Self::Neurotransmitter => "neurotransmitter",
            Self::VitamineKofaktoren => "vitamine_kofaktoren",
            Self::Diagnostik => "diagnostik",
        }
    }

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Aminosaeuren => "Aminosäurestoffwechsel",
            Self::Harnstoffzyklus => "Harnstoffzyklusdefekte",
            Self::Organoazidurien => "Organoazidurien",
            Self::Fettsaeureoxidation => "Fettsäureoxidationsstörungen",
            Self::Kohlenhydrate => "Kohlenhydratstoffwechsel",
            Self::LysosomaleSpeicher => "Lysosomale Speicherkrankheiten",
            Self::PeroxisomaleErkrankungen => "Peroxisomale Erkrankungen",
            Self::Mitochondriopathien => "Mitochondriopathien",
            Self::PurinPyrimidin => "Purin- und Pyrimidinstoffwechsel",
            Self::Neurotransmitter => "Neurotransmitterdefekte",
            Self::VitamineKofaktoren => "Vitamine und Kofaktoren",
            Self::Diagnostik => "Diagnostik und Labor",
        }
    }

    /// Folder that holds this category's documents
    pub fn folder(&self) -> &'static str {
        self.key()
    }

    /// Domain-specific filename stems for this category
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::Aminosaeuren => &[
                "phenylketonurie",
                "pku",
                "hyperphenylalaninaemie",
                "ahornsirupkrankheit",
                "msud",
                "tyrosinaemie",
                "homocystinurie",
                "alkaptonurie",
                "nichtketotische_hyperglycinaemie",
            ],
            Self::Harnstoffzyklus => &[
                "harnstoffzyklus",
                "otc_mangel",
                "citrullinaemie",
                "argininbernsteinsaeure",
                "argininaemie",
                "hyperammonaemie",
                "cps1_mangel",
                "nags_mangel",
            ],
            Self::Organoazidurien => &[
                "propionazidaemie",
                "methylmalonazidurie",
                "isovalerianazidaemie",
                "glutarazidurie",
                "glutarazidurie_typ1",
                "biotinidasemangel",
                "3_mcc_mangel",
            ],
            Self::Fettsaeureoxidation => &[
                "mcad",
                "mcad_mangel",
                "lchad",
                "vlcad",
                "carnitin",
                "carnitinmangel",
                "cpt1",
                "cpt2",
                "betaoxidation",
            ],
            Self::Kohlenhydrate => &[
                "galaktosaemie",
                "glykogenose",
                "glykogenose_typ1",
                "glykogenose_typ2",
                "fruktoseintoleranz",
                "hypoglykaemie",
                "pyruvat",
            ],
            Self::LysosomaleSpeicher => &[
                "morbus_gaucher",
                "morbus_fabry",
                "morbus_pompe",
                "mukopolysaccharidosen",
                "mps",
                "sphingolipidosen",
                "enzymersatztherapie",
            ],
            Self::PeroxisomaleErkrankungen => &[
                "zellweger",
                "zellweger_spektrum",
                "adrenoleukodystrophie",
                "x_ald",
                "refsum",
                "plasmalogene",
            ],
            Self::Mitochondriopathien => &[
                "atmungskette",
                "leigh_syndrom",
                "melas",
                "merrf",
                "pdh_mangel",
                "laktatazidose",
                "coenzym_q10",
            ],
            Self::PurinPyrimidin => &[
                "lesch_nyhan",
                "gicht",
                "adenylosuccinat",
                "dpd_mangel",
                "harnsaeure",
            ],
            Self::Neurotransmitter => &[
                "tetrahydrobiopterin",
                "bh4",
                "aadc_mangel",
                "gaba",
                "dopamin",
                "serotonin",
            ],
            Self::VitamineKofaktoren => &[
                "biotin",
                "cobalamin",
                "vitamin_b12",
                "folat",
                "pyridoxin",
                "vitamin_b6",
                "thiamin",
                "riboflavin",
            ],
            Self::Diagnostik => &[
                "neugeborenenscreening",
                "tandem_ms",
                "aminosaeuren_plasma",
                "organische_saeuren",
                "acylcarnitine",
                "laborwerte",
                "notfall",
                "notfallprotokoll",
            ],
        }
    }

    /// Parse a category key, rejecting anything outside the catalog
    pub fn from_key(key: &str) -> Result<Self> {
        ALL_CATEGORIES
            .iter()
            .copied()
            .find(|c| c.key() == key)
            .ok_or_else(|| MedfinderError::UnknownCategory(key.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = MedfinderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_key(s)
    }
}
