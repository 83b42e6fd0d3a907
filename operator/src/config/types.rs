use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct OperatorConfig {
    /// Namespace holding the signing controller and its CA material.
    /// Env: SVCCA_NAMESPACE
    #[envconfig(from = "SVCCA_NAMESPACE", default = "service-ca")]
    pub namespace: String,

    /// Image for the managed signing controller deployment.
    /// Env: SVCCA_CONTROLLER_IMAGE
    #[envconfig(
        from = "SVCCA_CONTROLLER_IMAGE",
        default = "ghcr.io/svcca/service-ca-controller:latest"
    )]
    pub controller_image: String,

    #[envconfig(from = "SVCCA_CONTROLLER_REPLICAS", default = "1")]
    pub controller_replicas: i32,

    /// Periodic resync interval in seconds after a clean reconcile.
    /// Env: SVCCA_RESYNC_INTERVAL_SECS
    #[envconfig(from = "SVCCA_RESYNC_INTERVAL_SECS", default = "300")]
    pub resync_interval_secs: u64,

    /// Requeue delay in seconds after a failed reconcile.
    /// Env: SVCCA_RETRY_INTERVAL_SECS
    #[envconfig(from = "SVCCA_RETRY_INTERVAL_SECS", default = "30")]
    pub retry_interval_secs: u64,

    /// Validity window for a freshly minted signing CA, in days.
    /// Env: SVCCA_CA_VALIDITY_DAYS
    #[envconfig(from = "SVCCA_CA_VALIDITY_DAYS", default = "790")]
    pub ca_validity_days: u32,
}
