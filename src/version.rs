use std::fmt;

lazy_static! {
    /// Build metadata, fixed at compile time.
    pub static ref BUILD_INFO: BuildInfo = BuildInfo::from_env();
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: semver::Version,
    pub revision: &'static str,
    pub branch: &'static str,
    pub build_user: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl BuildInfo {
    fn from_env() -> Self {
        Self {
            version: semver::Version::parse(crate_version!())
                .unwrap_or_else(|_| semver::Version::new(0, 0, 0)),
            revision: option_env!("GIT_REVISION").unwrap_or("unknown"),
            branch: option_env!("GIT_BRANCH").unwrap_or("unknown"),
            build_user: option_env!("BUILD_USER").unwrap_or("unknown"),
            build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
            target: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }

    pub fn log(&self) {
        info!(
            "version={} branch={} revision={}",
            self.version, self.branch, self.revision
        );
        info!(
            "build context: platform={} build_user={} build_date={}",
            self.target, self.build_user, self.build_date
        );
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{}\nrevision: {} ({})\nbuilt: {} by {}\nplatform: {}",
            self.version,
            self.revision,
            self.branch,
            self.build_date,
            self.build_user,
            self.target
        )
    }
}
