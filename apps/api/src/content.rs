//! Static educational content served alongside the classifier.

use serde::Serialize;

use crate::classifier::LABELS;

#[derive(Debug, Serialize)]
pub struct Topic {
    pub title: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WarningSign {
    pub letter: char,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ResearchItem {
    pub title: &'static str,
    pub summary: &'static str,
    pub link: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LabelInfo {
    pub index: usize,
    pub code: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EducationalContent {
    pub overview: &'static [Topic],
    pub abcde: &'static [WarningSign],
    pub cancer_types: &'static [Topic],
    pub research: &'static [ResearchItem],
    pub labels: Vec<LabelInfo>,
}

const OVERVIEW: &[Topic] = &[
    Topic {
        title: "What is skin cancer?",
        body: "Skin cancer is the uncontrolled growth of abnormal skin cells, most often \
               triggered by DNA damage from ultraviolet radiation from the sun or tanning beds. \
               Basal cell and squamous cell carcinoma are generally less aggressive; melanoma is \
               the most dangerous form and can spread rapidly if not detected early.",
    },
    Topic {
        title: "Prevention",
        body: "Regular skin checks, sunscreen, and limiting sun exposure reduce risk. Consult a \
               healthcare professional about any unusual change in a mole, spot, or skin texture.",
    },
];

const ABCDE: &[WarningSign] = &[
    WarningSign {
        letter: 'A',
        name: "Asymmetry",
        description: "One half of the mole or spot does not match the other.",
    },
    WarningSign {
        letter: 'B',
        name: "Border",
        description: "Irregular, blurred, or jagged edges instead of smooth, even borders.",
    },
    WarningSign {
        letter: 'C',
        name: "Color",
        description: "Several colors (shades of brown, black, red, white, or blue) instead of one \
                       uniform color.",
    },
    WarningSign {
        letter: 'D',
        name: "Diameter",
        description: "Larger than 6mm, about the size of a pencil eraser, though melanomas can be \
                      smaller.",
    },
    WarningSign {
        letter: 'E',
        name: "Evolving",
        description: "Changes in size, shape, color, or elevation over time, or new symptoms such \
                      as bleeding or itching.",
    },
];

const CANCER_TYPES: &[Topic] = &[
    Topic {
        title: "Basal Cell Carcinoma (BCC)",
        body: "The most common type. Usually found on sun-exposed areas such as the head and \
               neck. Grows slowly and rarely spreads.",
    },
    Topic {
        title: "Squamous Cell Carcinoma (SCC)",
        body: "The second most common type. Often appears on sun-exposed skin and can grow into \
               deeper layers and spread.",
    },
    Topic {
        title: "Melanoma",
        body: "The most dangerous type. Can develop from moles and spread quickly if not detected \
               early.",
    },
    Topic {
        title: "Merkel Cell Carcinoma (MCC)",
        body: "A rare but aggressive form that tends to grow quickly and spread.",
    },
    Topic {
        title: "Actinic Keratosis",
        body: "Precancerous patches on sun-exposed skin that can turn into squamous cell \
               carcinoma.",
    },
];

const RESEARCH: &[ResearchItem] = &[
    ResearchItem {
        title: "Artificial Intelligence in Skin Cancer Detection",
        summary: "Convolutional networks reach dermatologist-level accuracy on dermatoscopic \
                  images; current work targets diverse skin tones and types.",
        link: "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC7442686/",
    },
    ResearchItem {
        title: "Personalized Cancer Therapy",
        summary: "Treatment tailored to the genetic mutations of a melanoma. Immunotherapy and \
                  targeted therapies show promise for advanced stages.",
        link: "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC6068306/",
    },
    ResearchItem {
        title: "Non-Invasive Diagnostic Methods",
        summary: "Imaging such as reflectance confocal microscopy improves early detection and is \
                  being combined with AI-based diagnostics.",
        link: "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC6070861/",
    },
    ResearchItem {
        title: "Public Awareness and Early Detection",
        summary: "Public health campaigns for regular skin checks, sun protection, and \
                  self-examination.",
        link: "https://www.cancer.org/latest-news.html",
    },
];

pub fn educational_content() -> EducationalContent {
    EducationalContent {
        overview: OVERVIEW,
        abcde: ABCDE,
        cancer_types: CANCER_TYPES,
        research: RESEARCH,
        labels: LABELS
            .iter()
            .enumerate()
            .map(|(index, entry)| LabelInfo {
                index,
                code: entry.code,
                name: entry.name,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abcde_letters_in_order() {
        let letters: String = ABCDE.iter().map(|s| s.letter).collect();
        assert_eq!(letters, "ABCDE");
    }

    #[test]
    fn test_content_lists_every_model_label() {
        let content = educational_content();
        assert_eq!(content.labels.len(), 7);
        assert_eq!(content.labels[4].code, "mel");
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["research"].as_array().unwrap().len(), 4);
    }
}
