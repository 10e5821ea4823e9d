pub const CONFIG_TEMPLATE: &str = r#"{
  // Base URL of the VMS integration API; every endpoint path (e.g. /v2/vms/types)
  // is appended to it
  "baseUrl": "http://localhost:8080/api",

  // Character placed between nested keys when field structures are flattened
  // into source-field paths. The server must parse paths with the same character.
  // Observed values: "." (default) or "-"
  "pathSeparator": ".",

  // Maximum nesting depth accepted when flattening a field structure sample
  "maxDepth": 32,

  // HTTP request timeout in seconds
  "timeoutSecs": 30,

  // Overrides for user-facing messages, keyed by message id.
  // Placeholders such as {vms}, {field} and {status} are substituted.
  "messages": {
    // "noTransformations": "등록된 필드 변환 규칙이 없습니다.",
    // "transformationAdded": "{vms} VMS에 새 변환 규칙이 추가되었습니다."
  }
}
"#;
