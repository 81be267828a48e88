const ENDPOINT_SCHEME_PREFIX: &str = "https://";

// Host fragments of the public and Azure-hosted OpenAI deployments.
const SUPPORTED_ENDPOINT_FRAGMENTS: &[&str] = &["openai.azure.com", "api.openai.com"];

/// True iff `endpoint` starts with `https://`, ignoring ASCII case.
pub fn is_endpoint_valid(endpoint: &str) -> bool {
    endpoint
        .get(..ENDPOINT_SCHEME_PREFIX.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(ENDPOINT_SCHEME_PREFIX))
}

/// True iff `endpoint` contains one of the supported host fragments, ignoring
/// ASCII case.
///
/// This is a substring match over the whole string, not URL parsing: a host
/// such as `api.openai.com.example.net` passes. It is a sanity check only.
pub fn is_endpoint_supported(endpoint: &str) -> bool {
    let lowered = endpoint.to_ascii_lowercase();
    SUPPORTED_ENDPOINT_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}
