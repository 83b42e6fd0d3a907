use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    IsCa, KeyPair, KeyUsagePurpose,
};
use time::{Duration, OffsetDateTime};

pub struct SigningCa {
    pub cert_pem: String,
    pub key_pem: String,
}

/// Common name for a fresh signer, carrying the rotation timestamp so every
/// generation is distinguishable.
pub fn signer_common_name() -> String {
    format!(
        "service-ca@{}",
        OffsetDateTime::now_utc().unix_timestamp()
    )
}

/// Mint a self-signed signing CA. Backdates notBefore slightly to tolerate
/// clock skew between the operator and the API servers.
pub fn mint_signing_ca(
    common_name: &str,
    validity_days: u32,
) -> Result<SigningCa, rcgen::Error> {
    let mut params = CertificateParams::default();

    let mut dn = DistinguishedName::new();
    dn.push(
        DnType::CommonName,
        DnValue::Utf8String(common_name.to_string()),
    );
    params.distinguished_name = dn;

    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];

    let now = OffsetDateTime::now_utc();
    params.not_before = now - Duration::minutes(5);
    params.not_after = now + Duration::days(i64::from(validity_days));

    let key_pair = KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;

    Ok(SigningCa {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}
