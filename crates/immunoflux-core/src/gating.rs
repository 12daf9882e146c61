use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;

const DEFAULT_DEFINITIONS: &str = "
Alveolar Macrophages: CD11b+ HLA-DR+ CD206+ CD169+ CD64+ CD11c+ CD14lo CD14- CD45+
Interstitial Macrophages: CD64+ CD169lo CD206int HLA-DR+ CD11c+ CD45+
DCs: CD11c+ HLA-DR+ CD169- CD15- CD45+
Monocytes: CD169- CD206- CD14+ CD45+
Classical Monocytes: CD14hi CD16- CD45+
Intermediate Monocytes: CD14hi CD16+ CD45+
Nonclassical Monocytes: CD14+ CD16hi CD45+
Neutrophils: CD16+ CD24+ CD15+ CD66bhi CD45+
Epithelial Cells: EpCAM(CD326)+ CD45- CD31-
";

static DEFAULT_PANEL: Lazy<Panel> = Lazy::new(|| Panel::parse(DEFAULT_DEFINITIONS));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Expression {
    Negative,
    Positive,
    High,
    Low,
    Intermediate,
}

impl Expression {
    /// Suffixes in the order they are tried.
    const SUFFIXES: [(&'static str, Expression); 5] = [
        ("-", Expression::Negative),
        ("+", Expression::Positive),
        ("hi", Expression::High),
        ("lo", Expression::Low),
        ("int", Expression::Intermediate),
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Expression::Negative => "-",
            Expression::Positive => "+",
            Expression::High => "hi",
            Expression::Low => "lo",
            Expression::Intermediate => "int",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressedMarker {
    pub marker: String,
    pub expression: Expression,
}

impl ExpressedMarker {
    pub fn parse(token: &str) -> Option<Self> {
        Expression::SUFFIXES.iter().find_map(|(suffix, expression)| {
            let marker = token.strip_suffix(suffix)?;
            if marker.is_empty() {
                return None;
            }
            Some(ExpressedMarker {
                marker: marker.to_string(),
                expression: *expression,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellPopulation {
    pub name: String,
    pub identifying_markers: Vec<ExpressedMarker>,
}

impl CellPopulation {
    /// Parses `<name>: <marker><expression> ...`; lines without a `:` are skipped.
    /// A marker listed twice keeps its last expression.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (name, markers) = line.split_once(':')?;
        let mut identifying_markers: Vec<ExpressedMarker> = Vec::new();
        for expressed in markers.split_whitespace().filter_map(ExpressedMarker::parse) {
            match identifying_markers
                .iter_mut()
                .find(|existing| existing.marker == expressed.marker)
            {
                Some(existing) => existing.expression = expressed.expression,
                None => identifying_markers.push(expressed),
            }
        }
        Some(CellPopulation {
            name: name.trim().to_string(),
            identifying_markers,
        })
    }

    pub fn expression_of(&self, marker: &str) -> Option<Expression> {
        self.identifying_markers
            .iter()
            .find(|expressed| expressed.marker == marker)
            .map(|expressed| expressed.expression)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub markers: Vec<String>,
    pub populations: Vec<CellPopulation>,
}

impl Panel {
    pub fn parse(definitions: &str) -> Self {
        let populations: Vec<CellPopulation> = definitions
            .lines()
            .filter_map(CellPopulation::parse_line)
            .collect();

        let mut markers: Vec<String> = Vec::new();
        for population in &populations {
            for expressed in &population.identifying_markers {
                if !markers.contains(&expressed.marker) {
                    markers.push(expressed.marker.clone());
                }
            }
        }

        Panel {
            markers,
            populations,
        }
    }

    /// Built-in lung myeloid/epithelial panel.
    pub fn default_panel() -> &'static Panel {
        &DEFAULT_PANEL
    }

    /// Number of populations identified by each marker, in panel marker order.
    pub fn population_count_per_marker(&self) -> Vec<(String, usize)> {
        self.markers
            .iter()
            .map(|marker| {
                let count = self
                    .populations
                    .iter()
                    .filter(|population| population.expression_of(marker).is_some())
                    .count();
                (marker.clone(), count)
            })
            .collect()
    }

    pub fn expression_groups_for_marker(&self, marker: &str) -> BTreeMap<Expression, Vec<String>> {
        let mut groups: BTreeMap<Expression, Vec<String>> = BTreeMap::new();
        for population in &self.populations {
            if let Some(expression) = population.expression_of(marker) {
                groups
                    .entry(expression)
                    .or_default()
                    .push(population.name.clone());
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_expression_suffixes() {
        let marker = ExpressedMarker::parse("CD14hi").expect("hi marker");
        assert_eq!(marker.marker, "CD14");
        assert_eq!(marker.expression, Expression::High);

        let marker = ExpressedMarker::parse("HLA-DR+").expect("positive marker");
        assert_eq!(marker.marker, "HLA-DR");
        assert_eq!(marker.expression, Expression::Positive);

        assert!(ExpressedMarker::parse("CD14").is_none());
    }

    #[test]
    fn later_expression_wins_for_repeated_marker() {
        let population = CellPopulation::parse_line("AM: CD14lo CD14-").expect("population");
        assert_eq!(population.identifying_markers.len(), 1);
        assert_eq!(population.expression_of("CD14"), Some(Expression::Negative));
    }

    #[test]
    fn default_panel_counts_populations_per_marker() {
        let panel = Panel::default_panel();
        assert_eq!(panel.populations.len(), 9);
        assert_eq!(panel.markers[0], "CD11b");

        let counts: BTreeMap<_, _> = panel.population_count_per_marker().into_iter().collect();
        assert_eq!(counts["CD45"], 9);
        assert_eq!(counts["CD16"], 4);

        let groups = panel.expression_groups_for_marker("CD16");
        assert_eq!(groups[&Expression::High], vec!["Nonclassical Monocytes"]);
        assert_eq!(
            groups[&Expression::Positive],
            vec!["Intermediate Monocytes", "Neutrophils"]
        );
    }
}
