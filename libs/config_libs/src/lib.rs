use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Loads `config_path` and overlays environment variables such as
/// `POST_DATABASE__URL` for `prefix = "POST"`.
pub fn libs_config<T>(config_path: &str, prefix: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Debug,
{
    dotenv().ok();

    Config::builder()
        .add_source(File::with_name(config_path))
        .add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Apps {
        address: String,
        port: u16,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Sample {
        apps: Apps,
    }

    #[test]
    fn reads_file_and_env_overrides() {
        let dir = std::env::temp_dir().join(format!("config_libs_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sample.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[apps]\naddress = \"127.0.0.1\"\nport = 8000").unwrap();

        std::env::set_var("CFGTEST_APPS__PORT", "9100");
        let loaded: Sample =
            libs_config(path.to_str().unwrap(), "CFGTEST").unwrap();
        std::env::remove_var("CFGTEST_APPS__PORT");

        assert_eq!(loaded.apps.address, "127.0.0.1");
        assert_eq!(loaded.apps.port, 9100);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        let loaded: Result<Sample, _> = libs_config("/definitely/not/here", "CFGTEST_MISSING");
        assert!(loaded.is_err());
    }
}
