//! Static technique catalog and keyword tables.
//!
//! Technique ids carry their EPIC phase as a prefix: `1.x` explore,
//! `2.x` probe, `3.x` impact, `4.x` commit. The `x.0` entries are phase
//! markers and are excluded from evaluation prompts.

use serde::{Deserialize, Serialize};

use crate::models::CustomerAttitude;

/// The four phases of the EPIC discovery framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpicPhase {
    Explore,
    Probe,
    Impact,
    Commit,
}

impl EpicPhase {
    /// The reserved id prefix for this phase
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EpicPhase::Explore => "1.",
            EpicPhase::Probe => "2.",
            EpicPhase::Impact => "3.",
            EpicPhase::Commit => "4.",
        }
    }

    /// Whether a technique id falls in this phase's reserved range
    pub fn contains_id(&self, technique_id: &str) -> bool {
        technique_id.starts_with(self.id_prefix())
    }
}

/// One entry in the technique catalog
#[derive(Debug, Clone)]
pub struct Technique {
    pub id: &'static str,
    pub name: &'static str,
    pub phase: EpicPhase,
    pub definition: &'static str,
    pub example: &'static str,
    /// Phase markers label a phase rather than a concrete technique
    pub phase_marker: bool,
}

/// The full technique catalog, in id order
pub const CATALOG: &[Technique] = &[
    Technique {
        id: "1.0",
        name: "Explore",
        phase: EpicPhase::Explore,
        definition: "Fase-marker: de situatie van de klant verkennen.",
        example: "",
        phase_marker: true,
    },
    Technique {
        id: "1.1",
        name: "Open situatievraag",
        phase: EpicPhase::Explore,
        definition: "Een open vraag naar de huidige situatie van de klant.",
        example: "Hoe pakken jullie dat op dit moment aan?",
        phase_marker: false,
    },
    Technique {
        id: "1.2",
        name: "Doorvragen op context",
        phase: EpicPhase::Explore,
        definition: "Een vervolgvraag die de context achter een antwoord verheldert.",
        example: "Wat maakt dat jullie daarvoor gekozen hebben?",
        phase_marker: false,
    },
    Technique {
        id: "1.3",
        name: "Samenvatten en toetsen",
        phase: EpicPhase::Explore,
        definition: "Het antwoord van de klant samenvatten en laten bevestigen.",
        example: "Als ik het goed begrijp, loopt het vooral vast bij de overdracht?",
        phase_marker: false,
    },
    Technique {
        id: "1.4",
        name: "Doel uitvragen",
        phase: EpicPhase::Explore,
        definition: "Vragen naar wat de klant wil bereiken.",
        example: "Waar willen jullie over een jaar staan?",
        phase_marker: false,
    },
    Technique {
        id: "2.0",
        name: "Probe",
        phase: EpicPhase::Probe,
        definition: "Fase-marker: het probleem scherp krijgen.",
        example: "",
        phase_marker: true,
    },
    Technique {
        id: "2.1",
        name: "Probleemvraag",
        phase: EpicPhase::Probe,
        definition: "Een directe vraag naar het knelpunt achter de situatie.",
        example: "Waar loopt u daarbij het meest tegenaan?",
        phase_marker: false,
    },
    Technique {
        id: "2.2",
        name: "Kwantificeren",
        phase: EpicPhase::Probe,
        definition: "Het probleem concreet maken in tijd, geld of aantallen.",
        example: "Hoeveel uur per week kost dat het team nu?",
        phase_marker: false,
    },
    Technique {
        id: "2.3",
        name: "Oorzaak achterhalen",
        phase: EpicPhase::Probe,
        definition: "Doorvragen naar de onderliggende oorzaak van het probleem.",
        example: "Waardoor ontstaat die vertraging volgens u?",
        phase_marker: false,
    },
    Technique {
        id: "3.0",
        name: "Impact",
        phase: EpicPhase::Impact,
        definition: "Fase-marker: de gevolgen van het probleem uitvergroten.",
        example: "",
        phase_marker: true,
    },
    Technique {
        id: "3.1",
        name: "Gevolgvraag",
        phase: EpicPhase::Impact,
        definition: "Vragen wat het probleem betekent voor de bredere organisatie.",
        example: "Wat betekent dat voor de rest van de afdeling?",
        phase_marker: false,
    },
    Technique {
        id: "3.2",
        name: "Persoonlijke impact",
        phase: EpicPhase::Impact,
        definition: "De gevolgen voor de gesprekspartner zelf benoemen.",
        example: "En wat doet dat met uw eigen planning?",
        phase_marker: false,
    },
    Technique {
        id: "3.3",
        name: "Toekomstprojectie",
        phase: EpicPhase::Impact,
        definition: "Schetsen wat er gebeurt als het probleem blijft bestaan.",
        example: "Hoe ziet dit er over zes maanden uit als er niets verandert?",
        phase_marker: false,
    },
    Technique {
        id: "4.0",
        name: "Commit",
        phase: EpicPhase::Commit,
        definition: "Fase-marker: naar een concrete vervolgstap bewegen.",
        example: "",
        phase_marker: true,
    },
    Technique {
        id: "4.1",
        name: "Proefafsluiting",
        phase: EpicPhase::Commit,
        definition: "Toetsen of de klant klaar is voor een vervolgstap.",
        example: "Stel dat dit opgelost is, wat zou u dan als eerste doen?",
        phase_marker: false,
    },
    Technique {
        id: "4.2",
        name: "Concrete vervolgstap",
        phase: EpicPhase::Commit,
        definition: "Een specifieke, geplande vervolgafspraak voorstellen.",
        example: "Zullen we donderdag een demo inplannen met uw team?",
        phase_marker: false,
    },
    Technique {
        id: "4.3",
        name: "Wederzijdse commitment",
        phase: EpicPhase::Commit,
        definition: "De klant om een eigen actie vragen voor de volgende stap.",
        example: "Kunt u de cijfers van vorig kwartaal voor die afspraak aanleveren?",
        phase_marker: false,
    },
];

/// Catalog entries that appear in evaluation prompts (phase markers excluded)
pub fn prompt_catalog() -> impl Iterator<Item = &'static Technique> {
    CATALOG.iter().filter(|t| !t.phase_marker)
}

/// Look up a catalog entry by id
pub fn technique_by_id(id: &str) -> Option<&'static Technique> {
    CATALOG.iter().find(|t| t.id == id)
}

/// Recommended technique ids for a resolved customer attitude.
///
/// The match is total; `Neutraal` carries no recommendation.
pub fn techniques_for_attitude(attitude: CustomerAttitude) -> Vec<String> {
    let ids: &[&str] = match attitude {
        CustomerAttitude::Vraag => &["1.3", "2.1"],
        CustomerAttitude::Twijfel => &["3.1", "3.3"],
        CustomerAttitude::Bezwaar => &["1.3", "3.2"],
        CustomerAttitude::Uitstel => &["3.3", "4.1"],
        CustomerAttitude::Interesse => &["2.2", "4.1"],
        CustomerAttitude::Akkoord => &["4.2", "4.3"],
        CustomerAttitude::Neutraal => &[],
    };
    ids.iter().map(|s| s.to_string()).collect()
}

/// Explore theme families: (name, keywords matched in seller text).
/// The explore coverage score is the fraction of families found.
pub const EXPLORE_THEMES: &[(&str, &[&str])] = &[
    ("situatie", &["situatie", "op dit moment", "momenteel", "huidige"]),
    ("werkwijze", &["hoe pakken", "werkwijze", "proces", "aanpak"]),
    ("aanleiding", &["aanleiding", "waarom nu", "wat maakt dat"]),
    ("doel", &["doel", "bereiken", "willen jullie", "ambitie"]),
    ("betrokkenen", &["wie", "beslist", "team", "collega"]),
    ("eerdere oplossingen", &["geprobeerd", "eerder", "alternatief"]),
];

/// Phrases that mark a defensive reaction to an objection
pub const DEFENSIVE_PHRASES: &[&str] = &[
    "ja maar",
    "dat klopt niet",
    "dat is niet zo",
    "dat valt wel mee",
    "u begrijpt het verkeerd",
    "nee hoor",
];

/// Phrases in seller turns that state a benefit
pub const BENEFIT_PHRASES: &[&str] = &[
    "voordeel",
    "bespaart",
    "bespaar",
    "levert op",
    "scheelt",
    "winst",
];

/// Phrases that translate a benefit into concrete value
pub const VALUE_PHRASES: &[&str] = &[
    "euro",
    "\u{20ac}",
    "procent",
    "%",
    "per maand",
    "per jaar",
    "per week",
    "uur",
];
