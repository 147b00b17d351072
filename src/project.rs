// ============================================================================
// Project type - target platform derived from metadata references
// ============================================================================

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "NET4")]
    Net4,
    #[serde(rename = "NET45")]
    Net45,
    #[serde(rename = "WP7")]
    Wp7,
    #[serde(rename = "WP8")]
    Wp8,
    #[serde(rename = "NETOther")]
    NetOther,
}

impl ProjectType {
    /// Derives the platform from metadata reference display strings
    /// (typically reference assembly paths).
    ///
    /// Checks run in precedence order over all references: any phone
    /// reference makes a phone project, then .NET 4.0, then 4.5.
    pub fn from_references<I, R>(references: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        let references: Vec<R> = references.into_iter().collect();
        let any = |needles: &[&str]| {
            references
                .iter()
                .any(|r| needles.iter().any(|needle| r.as_ref().contains(*needle)))
        };

        if any(&["Windows Phone", "WindowsPhone"]) {
            if any(&["Windows Phone\\v8"]) {
                ProjectType::Wp8
            } else {
                ProjectType::Wp7
            }
        } else if any(&["Framework\\v4.0"]) {
            ProjectType::Net4
        } else if any(&["Framework\\v4.5", ".NETCore\\v4.5"]) {
            ProjectType::Net45
        } else {
            ProjectType::NetOther
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Net4 => "NET4",
            ProjectType::Net45 => "NET45",
            ProjectType::Wp7 => "WP7",
            ProjectType::Wp8 => "WP8",
            ProjectType::NetOther => "NETOther",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project metadata as handed over by the front end.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub language: String,
    pub references: Vec<String>,
    #[serde(skip)]
    project_type: OnceCell<ProjectType>,
}

impl Project {
    pub fn new(name: impl Into<String>, language: impl Into<String>, references: Vec<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            references,
            project_type: OnceCell::new(),
        }
    }

    pub fn is_csharp(&self) -> bool {
        self.language == "C#"
    }

    /// Derived on first use, then cached for the project's lifetime.
    pub fn project_type(&self) -> ProjectType {
        *self.project_type.get_or_init(|| {
            let project_type = ProjectType::from_references(&self.references);
            debug!(project = %self.name, %project_type, "project type derived");
            project_type
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desktop_frameworks() {
        let net4 = [r"C:\Program Files\Reference Assemblies\Microsoft\Framework\.NETFramework\v4.0\mscorlib.dll"];
        assert_eq!(ProjectType::from_references(net4), ProjectType::Net4);

        let net45 = [r"C:\Program Files\Reference Assemblies\Microsoft\Framework\.NETFramework\v4.5\System.dll"];
        assert_eq!(ProjectType::from_references(net45), ProjectType::Net45);

        let store = [r"C:\Program Files\Reference Assemblies\Microsoft\Framework\.NETCore\v4.5\System.Runtime.dll"];
        assert_eq!(ProjectType::from_references(store), ProjectType::Net45);
    }

    #[test]
    fn test_phone_wins_over_framework() {
        let refs = [
            r"C:\Program Files\Reference Assemblies\Microsoft\Framework\.NETFramework\v4.0\mscorlib.dll",
            r"C:\Program Files\Reference Assemblies\Microsoft\Framework\Silverlight\v4.0\Profile\WindowsPhone71\System.dll",
        ];
        assert_eq!(ProjectType::from_references(refs), ProjectType::Wp7);

        let wp8 = [
            r"C:\Program Files\Reference Assemblies\Microsoft\Framework\WindowsPhone\v8.0\mscorlib.dll",
            r"C:\Program Files\Microsoft SDKs\Windows Phone\v8.0\Tools\MicrosoftPhone.dll",
        ];
        assert_eq!(ProjectType::from_references(wp8), ProjectType::Wp8);
    }

    #[test]
    fn test_unknown_references() {
        assert_eq!(ProjectType::from_references(Vec::<String>::new()), ProjectType::NetOther);
        assert_eq!(ProjectType::from_references(["mono/4.5/mscorlib.dll"]), ProjectType::NetOther);
    }

    #[test]
    fn test_project_caches_type() {
        let project = Project::new(
            "Client",
            "C#",
            vec![r"Framework\.NETFramework\v4.5\System.dll".to_string()],
        );
        assert!(project.is_csharp());
        assert_eq!(project.project_type(), ProjectType::Net45);
        assert_eq!(project.project_type(), ProjectType::Net45);
        assert_eq!(project.project_type().to_string(), "NET45");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&ProjectType::NetOther).unwrap(), "\"NETOther\"");
        let parsed: ProjectType = serde_json::from_str("\"WP8\"").unwrap();
        assert_eq!(parsed, ProjectType::Wp8);

        let vb = Project::new("Legacy", "Visual Basic", Vec::new());
        assert!(!vb.is_csharp());
    }
}
