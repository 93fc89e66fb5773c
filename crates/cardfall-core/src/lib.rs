#![deny(warnings)]

pub mod game;
pub mod model;

/// Build metadata surfaced to hosts and harnesses.
pub struct EngineInfo;

impl EngineInfo {
    pub const NAME: &'static str = "cardfall";
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    pub fn describe() -> String {
        format!("{} {}", Self::NAME, Self::VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::EngineInfo;

    #[test]
    fn describe_contains_name_and_version() {
        let text = EngineInfo::describe();
        assert!(text.starts_with(EngineInfo::NAME));
        assert!(text.contains(EngineInfo::VERSION));
    }
}
