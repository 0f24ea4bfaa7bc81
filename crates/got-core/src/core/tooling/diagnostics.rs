pub mod codes {
    pub const CONFIGURATION: &str = "GOT100";
    pub const NOT_TRACKED: &str = "GOT110";
    pub const VERSION: &str = "GOT120";
    pub const OUTSIDE_REPOSITORY: &str = "GOT130";
    pub const USAGE: &str = "GOT140";
    pub const TRANSPORT: &str = "GOT200";
    pub const INTEGRITY: &str = "GOT210";
    pub const GENERIC: &str = "GOT000";
}
