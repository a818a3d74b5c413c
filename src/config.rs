//! The configuration surface shared by `Manager` and `Server` (spec §6).

/// Constructor parameters for the manager and each worker.
#[derive(Debug, Clone)]
pub struct Config {
    /// `"<module>:<attribute[.sub]*>"`, resolved against the application
    /// registry at worker startup.
    pub app: String,
    pub host: String,
    pub port: u16,
    /// Manager-only: number of worker processes to spawn.
    pub workers: usize,
    /// Manager-only, informational: not used to configure the listener, to
    /// match the behavior observed in the server this spec was distilled
    /// from (spec §6).
    pub backlog: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: String::new(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: 1,
            backlog: 100,
        }
    }
}
