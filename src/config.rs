use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub graph: GraphConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub max_connections: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Number of component nodes sampled by the graph report
    pub report_sample_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: None,
            user: None,
            password: None,
            database: None,
            max_connections: Some(4),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            report_sample_size: 5,
        }
    }
}

/// Resolved connection settings for the graph store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
}

impl AppConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("config").required(false));

        // Add environment variables with prefix "COMPONENT_GRAPH_"
        config = config.add_source(
            config::Environment::with_prefix("COMPONENT_GRAPH")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Resolve the graph connection from config, then the NEO4J_* variables,
    /// then local development defaults
    pub fn connection(&self) -> ConnectionSettings {
        ConnectionSettings {
            uri: resolve(&self.graph.uri, "NEO4J_URI", "bolt://localhost:7687"),
            user: resolve(&self.graph.user, "NEO4J_USER", "neo4j"),
            password: resolve(&self.graph.password, "NEO4J_PASSWORD", "test1234"),
            database: resolve(&self.graph.database, "NEO4J_DATABASE", "neo4j"),
            max_connections: self.graph.max_connections.unwrap_or(4),
        }
    }
}

fn resolve(configured: &Option<String>, env_key: &str, fallback: &str) -> String {
    if let Some(value) = configured {
        return value.clone();
    }

    if let Ok(value) = std::env::var(env_key) {
        return value;
    }

    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_values_win_over_fallbacks() {
        let config = AppConfig {
            graph: GraphConfig {
                uri: Some("bolt://graph.internal:7687".to_string()),
                user: Some("importer".to_string()),
                password: Some("secret".to_string()),
                database: Some("architecture".to_string()),
                max_connections: Some(2),
            },
            import: ImportConfig::default(),
        };

        let connection = config.connection();
        assert_eq!(connection.uri, "bolt://graph.internal:7687");
        assert_eq!(connection.user, "importer");
        assert_eq!(connection.password, "secret");
        assert_eq!(connection.database, "architecture");
        assert_eq!(connection.max_connections, 2);
    }

    #[test]
    fn unset_values_fall_back() {
        assert_eq!(
            resolve(&None, "COMPONENT_GRAPH_TEST_UNSET_KEY", "fallback"),
            "fallback"
        );
        assert_eq!(
            resolve(&Some("set".to_string()), "COMPONENT_GRAPH_TEST_UNSET_KEY", "fallback"),
            "set"
        );
    }
}
