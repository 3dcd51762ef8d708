/*!
 * Provider Registry
 * Binds backend implementations to the protocol versions they speak
 */

use std::sync::Arc;

use tracing::info;

use crate::error::{BackendResult, ServiceError, ServiceResult};
use crate::model::{
    BiometricRecord, BiometricType, MatchDecision, Params, QualityCheck, Response, SdkInfo,
};

/// Protocol versions this service speaks.
pub const SPEC_VERSION_1_0: &str = "1.0";
pub const SUPPORTED_SPEC_VERSIONS: &[&str] = &[SPEC_VERSION_1_0];

/// Backend capability set. Calls are synchronous and may block.
pub trait BioApi: Send + Sync {
    fn init(&self, init_params: &Params) -> BackendResult<SdkInfo>;

    fn check_quality(
        &self,
        sample: &BiometricRecord,
        modalities: &[BiometricType],
        flags: &Params,
    ) -> BackendResult<Response<QualityCheck>>;

    fn match_records(
        &self,
        sample: &BiometricRecord,
        gallery: &[BiometricRecord],
        modalities: &[BiometricType],
        flags: &Params,
    ) -> BackendResult<Response<Vec<MatchDecision>>>;

    fn extract_template(
        &self,
        sample: &BiometricRecord,
        modalities: &[BiometricType],
        flags: &Params,
    ) -> BackendResult<Response<BiometricRecord>>;

    fn segment(
        &self,
        sample: &BiometricRecord,
        modalities: &[BiometricType],
        flags: &Params,
    ) -> BackendResult<Response<BiometricRecord>>;

    fn convert_format(
        &self,
        sample: &BiometricRecord,
        source_format: Option<&str>,
        target_format: Option<&str>,
        source_params: &Params,
        target_params: &Params,
        modalities: &[BiometricType],
    ) -> BackendResult<Response<BiometricRecord>>;
}

#[derive(Clone)]
pub struct ProviderBinding {
    spec_version: String,
    api: Arc<dyn BioApi>,
}

impl ProviderBinding {
    pub fn new(spec_version: impl Into<String>, api: Arc<dyn BioApi>) -> Self {
        Self {
            spec_version: spec_version.into(),
            api,
        }
    }

    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }

    pub fn api(&self) -> &dyn BioApi {
        self.api.as_ref()
    }
}

/// One binding per supported protocol version, all served by `api`.
pub fn bindings_for(api: Arc<dyn BioApi>) -> Vec<ProviderBinding> {
    SUPPORTED_SPEC_VERSIONS
        .iter()
        .map(|version| ProviderBinding::new(*version, api.clone()))
        .collect()
}

/// Immutable set of provider bindings, assembled once at startup.
pub struct ProviderRegistry {
    bindings: Vec<ProviderBinding>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Exact match on spec version. Never falls back to another binding.
    pub fn resolve(&self, version: &str) -> ServiceResult<&ProviderBinding> {
        self.bindings
            .iter()
            .find(|binding| binding.spec_version == version)
            .ok_or_else(|| ServiceError::NoProvider {
                version: version.to_string(),
            })
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|binding| binding.spec_version())
    }
}

#[derive(Default)]
pub struct ProviderRegistryBuilder {
    bindings: Vec<ProviderBinding>,
}

impl ProviderRegistryBuilder {
    /// Add a binding. A second binding for the same spec version is rejected.
    pub fn register(mut self, binding: ProviderBinding) -> ServiceResult<Self> {
        if self
            .bindings
            .iter()
            .any(|existing| existing.spec_version == binding.spec_version)
        {
            return Err(ServiceError::Config(format!(
                "duplicate provider for spec version {}",
                binding.spec_version
            )));
        }
        info!("Registered provider for spec version {}", binding.spec_version);
        self.bindings.push(binding);
        Ok(self)
    }

    pub fn register_all(
        self,
        bindings: impl IntoIterator<Item = ProviderBinding>,
    ) -> ServiceResult<Self> {
        bindings
            .into_iter()
            .try_fold(self, |builder, binding| builder.register(binding))
    }

    /// Fails when nothing was registered; the service cannot serve without a backend.
    pub fn build(self) -> ServiceResult<ProviderRegistry> {
        if self.bindings.is_empty() {
            return Err(ServiceError::Config(
                "no Bio SDK provider registered".to_string(),
            ));
        }
        Ok(ProviderRegistry {
            bindings: self.bindings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ReferenceBioApi;

    fn api() -> Arc<dyn BioApi> {
        Arc::new(ReferenceBioApi::new())
    }

    #[test]
    fn resolves_each_registered_version() {
        let registry = ProviderRegistry::builder()
            .register(ProviderBinding::new("1.0", api()))
            .unwrap()
            .register(ProviderBinding::new("1.1", api()))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(registry.resolve("1.0").unwrap().spec_version(), "1.0");
        assert_eq!(registry.resolve("1.1").unwrap().spec_version(), "1.1");
    }

    #[test]
    fn unregistered_version_never_falls_back() {
        let registry = ProviderRegistry::builder()
            .register_all(bindings_for(api()))
            .unwrap()
            .build()
            .unwrap();

        for version in ["2.0", "", "1", "1.0 ", "1.00"] {
            let err = registry.resolve(version).err().unwrap();
            assert!(matches!(err, ServiceError::NoProvider { .. }), "{}", version);
        }
    }

    #[test]
    fn duplicate_version_is_rejected() {
        let result = ProviderRegistry::builder()
            .register(ProviderBinding::new("1.0", api()))
            .unwrap()
            .register(ProviderBinding::new("1.0", api()));

        assert!(matches!(result.err().unwrap(), ServiceError::Config(_)));
    }

    #[test]
    fn empty_registry_is_a_config_error() {
        let result = ProviderRegistry::builder().build();
        assert!(matches!(result.err().unwrap(), ServiceError::Config(_)));
    }

    #[test]
    fn default_bindings_cover_supported_versions() {
        let registry = ProviderRegistry::builder()
            .register_all(bindings_for(api()))
            .unwrap()
            .build()
            .unwrap();
        let versions: Vec<&str> = registry.versions().collect();
        assert_eq!(versions, SUPPORTED_SPEC_VERSIONS);
    }

    #[test]
    fn resolve_is_safe_across_threads() {
        let registry = Arc::new(
            ProviderRegistry::builder()
                .register_all(bindings_for(api()))
                .unwrap()
                .build()
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.resolve("1.0").is_ok())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
