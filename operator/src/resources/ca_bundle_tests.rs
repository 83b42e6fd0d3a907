#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::ByteString;
    use k8s_openapi::api::core::v1::{ConfigMap, Secret};

    use crate::resources::ca_bundle::{bundle_current, cert_pem_from};

    const CERT: &str = "-----BEGIN CERTIFICATE-----\nabc\n-----END CERTIFICATE-----\n";

    fn bundle_with(value: &str) -> ConfigMap {
        let data: BTreeMap<String, String> =
            [("ca-bundle.crt".to_string(), value.to_string())]
                .into_iter()
                .collect();
        ConfigMap {
            data: Some(data),
            ..Default::default()
        }
    }

    #[test]
    fn missing_bundle_is_not_current() {
        assert!(!bundle_current(None, CERT));
        assert!(!bundle_current(Some(&ConfigMap::default()), CERT));
    }

    #[test]
    fn empty_bundle_is_not_current() {
        assert!(!bundle_current(Some(&bundle_with("")), CERT));
    }

    #[test]
    fn matching_bundle_is_current() {
        assert!(bundle_current(Some(&bundle_with(CERT)), CERT));
    }

    #[test]
    fn divergent_bundle_is_not_current() {
        // A leftover from a prior CA, or a manual edit, must be repaired.
        let stale = bundle_with(
            "-----BEGIN CERTIFICATE-----\nold\n-----END CERTIFICATE-----\n",
        );
        assert!(!bundle_current(Some(&stale), CERT));
    }

    #[test]
    fn cert_is_read_from_binary_data() {
        let secret = Secret {
            data: Some(
                [(
                    "tls.crt".to_string(),
                    ByteString(CERT.as_bytes().to_vec()),
                )]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        };
        assert_eq!(cert_pem_from(&secret).as_deref(), Some(CERT));
    }

    #[test]
    fn cert_is_read_from_string_data() {
        let secret = Secret {
            string_data: Some(
                [("tls.crt".to_string(), CERT.to_string())]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        };
        assert_eq!(cert_pem_from(&secret).as_deref(), Some(CERT));
    }

    #[test]
    fn empty_or_absent_cert_is_unusable() {
        assert_eq!(cert_pem_from(&Secret::default()), None);
        let empty = Secret {
            data: Some(
                [("tls.crt".to_string(), ByteString(Vec::new()))]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        };
        assert_eq!(cert_pem_from(&empty), None);
    }
}
