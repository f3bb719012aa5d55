#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use confique::Config;

    use crate::args::NamespaceSource;
    use crate::schema::Schema;

    #[allow(dead_code)]
    #[derive(Config, Debug)]
    pub struct TestConfig {
        /// The application host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,

        /// Enable debug mode.
        #[config(default = false)]
        pub debug: bool,

        /// Database settings.
        #[config(nested)]
        pub database: TestDbConfig,
    }

    #[allow(dead_code)]
    #[derive(Config, Debug)]
    pub struct TestDbConfig {
        /// Connection string URL.
        pub url: Option<String>,

        /// Connection pool size.
        #[config(default = 5)]
        pub pool_size: usize,
    }

    // -- Three-level schema used by the tree and builder tests -------------------

    fn level2(label: &str) -> Schema {
        Schema::new(format!("Level2Config{label}"))
            .value_with_default("value", format!("level 2 config {label} value"))
    }

    fn level1(label: &str) -> Schema {
        Schema::new(format!("Level1Config{label}"))
            .nested("l2a", level2("A"))
            .nested("l2b", level2("B"))
            .value_with_default("value", format!("level 1 config {label} value"))
    }

    pub fn layered_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new("RootConfigSchema")
                .nested("l1a", level1("A"))
                .nested("l1b", level1("B"))
                .nested(
                    "subsection",
                    Schema::new("SubSection")
                        .value("doc")
                        .value("key1")
                        .value_with_default("schema_default", "subsection default from schema"),
                )
                .value("nodefault")
                .value_with_default("value", "root config value"),
        )
    }

    pub fn map_source(pairs: &[(&str, &str)]) -> NamespaceSource {
        NamespaceSource::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }
}
