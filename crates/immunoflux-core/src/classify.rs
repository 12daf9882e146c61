use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;

/// Whether a panel export reports population frequencies or mean fluorescence intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelKind {
    Frequency,
    Mfi,
}

impl PanelKind {
    pub const ALL: [PanelKind; 2] = [PanelKind::Frequency, PanelKind::Mfi];

    /// Suffix appended to derived field names (`foldChangeMFI`, `deltaFrequency`, ...).
    pub fn field_suffix(&self) -> &'static str {
        match self {
            PanelKind::Frequency => "Frequency",
            PanelKind::Mfi => "MFI",
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    DonorPanel(PanelKind),
    CytokineFrequency,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::DonorPanel(kind) => write!(f, "donor panel ({kind})"),
            FileKind::CytokineFrequency => f.write_str("cytokine frequency"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellType {
    AlveolarMacrophages,
    InterstitialMacrophages,
    DendriticCells,
    NonclassicalMonocytes,
    IntermediateMonocytes,
    ClassicalMonocytes,
    Monocytes,
    Neutrophils,
    EpithelialCells,
    Cd4TCells,
    Cd8TCells,
    BCells,
    NkCells,
    Unknown(String),
}

/// Checked in order against the filename; more specific names come first.
const CANONICAL_CELL_TYPES: [CellType; 13] = [
    CellType::AlveolarMacrophages,
    CellType::InterstitialMacrophages,
    CellType::DendriticCells,
    CellType::NonclassicalMonocytes,
    CellType::IntermediateMonocytes,
    CellType::ClassicalMonocytes,
    CellType::Monocytes,
    CellType::Neutrophils,
    CellType::EpithelialCells,
    CellType::Cd4TCells,
    CellType::Cd8TCells,
    CellType::BCells,
    CellType::NkCells,
];

/// Marker-like tokens such as `cd4` and `cd8` are left out; they name panels,
/// not cell types.
const CELL_TYPE_ABBREVIATIONS: [(&str, CellType); 15] = [
    ("am", CellType::AlveolarMacrophages),
    ("ams", CellType::AlveolarMacrophages),
    ("im", CellType::InterstitialMacrophages),
    ("ims", CellType::InterstitialMacrophages),
    ("dc", CellType::DendriticCells),
    ("dcs", CellType::DendriticCells),
    ("ncmo", CellType::NonclassicalMonocytes),
    ("intmo", CellType::IntermediateMonocytes),
    ("cmo", CellType::ClassicalMonocytes),
    ("mono", CellType::Monocytes),
    ("monos", CellType::Monocytes),
    ("neut", CellType::Neutrophils),
    ("pmn", CellType::Neutrophils),
    ("epi", CellType::EpithelialCells),
    ("nk", CellType::NkCells),
];

impl CellType {
    pub fn canonical_name(&self) -> &str {
        match self {
            CellType::AlveolarMacrophages => "Alveolar Macrophages",
            CellType::InterstitialMacrophages => "Interstitial Macrophages",
            CellType::DendriticCells => "Dendritic Cells",
            CellType::NonclassicalMonocytes => "Nonclassical Monocytes",
            CellType::IntermediateMonocytes => "Intermediate Monocytes",
            CellType::ClassicalMonocytes => "Classical Monocytes",
            CellType::Monocytes => "Monocytes",
            CellType::Neutrophils => "Neutrophils",
            CellType::EpithelialCells => "Epithelial Cells",
            CellType::Cd4TCells => "CD4 T Cells",
            CellType::Cd8TCells => "CD8 T Cells",
            CellType::BCells => "B Cells",
            CellType::NkCells => "NK Cells",
            CellType::Unknown(name) => name,
        }
    }

    /// Infers the cell type from a source filename: canonical names first, then
    /// abbreviations, then the filename itself. Canonical names match anywhere in
    /// the filename once case and separators are ignored.
    pub fn from_file_name(file_name: &str) -> CellType {
        let tokens = filename_tokens(file_name);
        let compact = tokens.concat();

        for cell_type in CANONICAL_CELL_TYPES.iter() {
            let needle = filename_tokens(cell_type.canonical_name()).concat();
            if compact.contains(&needle) {
                return cell_type.clone();
            }
        }

        for (abbreviation, cell_type) in CELL_TYPE_ABBREVIATIONS.iter() {
            if tokens.iter().any(|token| token == abbreviation) {
                return cell_type.clone();
            }
        }

        CellType::Unknown(file_name.to_string())
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Lowercased alphanumeric runs of a filename.
fn filename_tokens(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
        .collect()
}

/// Filename-based classification rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClassifier {
    cytokine_keyword: String,
    mfi_keyword: String,
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl FileClassifier {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            cytokine_keyword: config.cytokine_keyword.to_ascii_lowercase(),
            mfi_keyword: config.mfi_keyword.to_ascii_lowercase(),
        }
    }

    pub fn classify(&self, file_name: &str) -> FileKind {
        let lower = file_name.to_ascii_lowercase();
        if lower.contains(&self.cytokine_keyword) {
            FileKind::CytokineFrequency
        } else {
            FileKind::DonorPanel(self.panel_kind(file_name))
        }
    }

    pub fn panel_kind(&self, file_name: &str) -> PanelKind {
        if file_name.to_ascii_lowercase().contains(&self.mfi_keyword) {
            PanelKind::Mfi
        } else {
            PanelKind::Frequency
        }
    }

    pub fn cell_type(&self, file_name: &str) -> CellType {
        CellType::from_file_name(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_wins_over_abbreviation() {
        assert_eq!(
            CellType::from_file_name("CD8_Classical_Monocytes_MFI.csv"),
            CellType::ClassicalMonocytes
        );
    }

    #[test]
    fn nonclassical_checked_before_classical() {
        assert_eq!(
            CellType::from_file_name("nonclassical monocytes.csv"),
            CellType::NonclassicalMonocytes
        );
    }

    #[test]
    fn canonical_name_matches_inside_longer_words() {
        assert_eq!(CellType::from_file_name("LungMonocytes.csv"), CellType::Monocytes);
        assert_eq!(CellType::from_file_name("Monocytes2.csv"), CellType::Monocytes);
        assert_eq!(
            CellType::from_file_name("run3_ClassicalMonocytes_MFI.csv"),
            CellType::ClassicalMonocytes
        );
        assert_eq!(
            CellType::from_file_name("NONCLASSICAL-monocytes.csv"),
            CellType::NonclassicalMonocytes
        );
    }

    #[test]
    fn marker_named_panels_are_not_t_cells() {
        assert_eq!(
            CellType::from_file_name("CD8_panel_MFI.csv"),
            CellType::Unknown("CD8_panel_MFI.csv".to_string())
        );
        assert_eq!(CellType::from_file_name("CD8 T cells.csv"), CellType::Cd8TCells);
    }

    #[test]
    fn abbreviation_must_be_whole_token() {
        assert_eq!(CellType::from_file_name("AM-panel.csv"), CellType::AlveolarMacrophages);
        assert_eq!(
            CellType::from_file_name("Sample_panel.csv"),
            CellType::Unknown("Sample_panel.csv".to_string())
        );
    }

    #[test]
    fn classifier_detects_cytokine_and_mfi_files() {
        let classifier = FileClassifier::default();
        assert_eq!(classifier.classify("Cytokine_MFI.csv"), FileKind::CytokineFrequency);
        assert_eq!(
            classifier.classify("Monocytes_mfi.csv"),
            FileKind::DonorPanel(PanelKind::Mfi)
        );
        assert_eq!(
            classifier.classify("Monocytes.csv"),
            FileKind::DonorPanel(PanelKind::Frequency)
        );
    }
}
