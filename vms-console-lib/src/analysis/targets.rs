use std::collections::HashSet;

/// Unified camera fields every mapping can target, with their display labels.
pub const STANDARD_TARGET_FIELDS: [(&str, &str); 12] = [
    ("name", "이름 (name)"),
    ("channel_ID", "채널 ID (channel_ID)"),
    ("channel_name", "채널 이름 (channel_name)"),
    ("ip_address", "IP 주소 (ip_address)"),
    ("port", "포트 (port)"),
    ("http_port", "HTTP 포트 (http_port)"),
    ("rtsp_url", "RTSP URL (rtsp_url)"),
    ("is_enabled", "활성화 여부 (is_enabled)"),
    ("status", "상태 (status)"),
    ("supports_PTZ", "PTZ 지원 여부 (supports_PTZ)"),
    ("supports_audio", "오디오 지원 여부 (supports_audio)"),
    ("original_id", "원본 ID (original_id)"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetField {
    pub value: String,
    pub label: String,
}

/// Target-field choices: the fixed standard list and, kept apart from it, the extra paths
/// discovered in the unified schema. Whether the server accepts targets outside the standard
/// list is not known, so neither group is treated as authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFieldOptions {
    standard: Vec<TargetField>,
    discovered: Vec<String>,
}

impl Default for TargetFieldOptions {
    fn default() -> Self {
        Self::standard()
    }
}

impl TargetFieldOptions {
    pub fn standard() -> Self {
        Self {
            standard: STANDARD_TARGET_FIELDS
                .iter()
                .map(|(value, label)| TargetField {
                    value: value.to_string(),
                    label: label.to_string(),
                })
                .collect(),
            discovered: Vec::new(),
        }
    }

    /// Adds unified-schema paths that are not already offered, keeping first-seen order.
    pub fn with_discovered<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: HashSet<String> = self
            .standard
            .iter()
            .map(|f| f.value.clone())
            .chain(self.discovered.iter().cloned())
            .collect();
        for path in paths {
            let path = path.into();
            if seen.insert(path.clone()) {
                self.discovered.push(path);
            }
        }
        self
    }

    pub fn standard_fields(&self) -> &[TargetField] {
        &self.standard
    }

    pub fn discovered_fields(&self) -> &[String] {
        &self.discovered
    }

    /// Standard fields followed by discovered ones; every value appears once.
    pub fn all(&self) -> Vec<&str> {
        self.standard
            .iter()
            .map(|f| f.value.as_str())
            .chain(self.discovered.iter().map(String::as_str))
            .collect()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.standard.iter().any(|f| f.value == value) || self.discovered.iter().any(|d| d == value)
    }

    pub fn is_standard(&self, value: &str) -> bool {
        self.standard.iter().any(|f| f.value == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_list() {
        let options = TargetFieldOptions::standard();
        assert_eq!(options.standard_fields().len(), 12);
        assert!(options.discovered_fields().is_empty());
        assert!(options.is_standard("channel_ID"));
        assert_eq!(options.all()[0], "name");
    }

    #[test]
    fn test_discovered_fields_are_deduplicated() {
        let options = TargetFieldOptions::standard().with_discovered(vec![
            "name",
            "location.floor",
            "port",
            "location.floor",
            "manufacturer",
        ]);

        assert_eq!(
            options.discovered_fields(),
            &["location.floor".to_string(), "manufacturer".to_string()]
        );

        let all = options.all();
        assert_eq!(all.len(), 14);
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());
        assert!(options.contains("manufacturer"));
        assert!(!options.is_standard("manufacturer"));
    }

    #[test]
    fn test_discovery_is_incremental() {
        let options = TargetFieldOptions::standard()
            .with_discovered(["a"])
            .with_discovered(["a", "b"]);
        assert_eq!(options.discovered_fields(), &["a".to_string(), "b".to_string()]);
    }
}
