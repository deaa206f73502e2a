use super::*;

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_base: "https://fleet-gateway.technotrek.ru/api/auth".to_string(),
            fleet_base: "https://fleet-api.technotrek.ru".to_string(),
            app_id: "7542fd74-47bd-4652-b422-6ef7d610582e".to_string(),
            request_timeout_secs: 10,
            page_limit: 100,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            active_interval_secs: 5 * 60,
            cooling_interval_secs: 10 * 60,
            idle_interval_secs: 60 * 60,
            idle_after_secs: 10 * 60,
            initial_interval_secs: 60 * 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/electrocars.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            polling: PollingConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
            credentials_file: "/data/electrocars_credentials.json".to_string(),
        }
    }
}
