//! Medical query expansion with fixed synonym clusters.

/// Trigger substring and the synonym cluster appended when it appears.
const EXPANSIONS: &[(&str, &str)] = &[
    ("diabetes", "diabetes mellitus diabetic hyperglycemia glucose insulin"),
    ("statin", "statin atorvastatin simvastatin lipid cholesterol"),
    ("elderly", "elderly older geriatric aged senior"),
    ("efficacy", "efficacy effectiveness outcome benefit"),
    ("covid", "covid-19 sars-cov-2 coronavirus pandemic"),
    ("vaccine", "vaccine vaccination immunization"),
    ("hypertension", "hypertension blood pressure cardiovascular"),
    ("cancer", "cancer tumor neoplasm malignancy oncology"),
];

/// Rewrites a query by appending domain synonym clusters.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    table: Vec<(String, String)>,
}

impl QueryExpander {
    pub fn new() -> Self {
        Self {
            table: EXPANSIONS
                .iter()
                .map(|(trigger, cluster)| (trigger.to_string(), cluster.to_string()))
                .collect(),
        }
    }

    /// Add a custom cluster after the built-in ones.
    pub fn with_cluster(mut self, trigger: impl Into<String>, cluster: impl Into<String>) -> Self {
        self.table.push((trigger.into().to_lowercase(), cluster.into()));
        self
    }

    /// Append every cluster whose trigger occurs in the query, in table order.
    ///
    /// Returns the query unchanged when nothing matches.
    pub fn expand(&self, query: &str) -> String {
        let lowered = query.to_lowercase();
        let clusters: Vec<&str> = self
            .table
            .iter()
            .filter(|(trigger, _)| lowered.contains(trigger.as_str()))
            .map(|(_, cluster)| cluster.as_str())
            .collect();

        if clusters.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, clusters.join(" "))
        }
    }
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::new()
    }
}
