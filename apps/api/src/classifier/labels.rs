//! Output order of the lesion model.
//!
//! The model was trained on HAM10000 with classes indexed in alphabetical
//! order of their dataset codes; index `i` of the probability vector belongs
//! to `LABELS[i]`. Changing this table without retraining mislabels every
//! prediction.

pub struct LabelEntry {
    pub code: &'static str,
    pub name: &'static str,
}

pub static LABELS: [LabelEntry; 7] = [
    LabelEntry { code: "akiec", name: "Actinic Keratoses" },
    LabelEntry { code: "bcc", name: "Basal Cell Carcinoma" },
    LabelEntry { code: "bkl", name: "Benign Keratosis" },
    LabelEntry { code: "df", name: "Dermatofibroma" },
    LabelEntry { code: "mel", name: "Melanoma" },
    LabelEntry { code: "nv", name: "Melanocytic Nevi" },
    LabelEntry { code: "vasc", name: "Vascular Lesions" },
];
