pub mod resource;
pub mod wav;

pub use resource::{Resource, ResourceHandle, ResourceRegistry};
pub use wav::{WavHeader, WAV_CONTENT_TYPE};

use promocast_core::WavError;

/// Decode base64 PCM from the speech API, wrap it as WAV and register it.
/// The returned handle owns the registry entry.
pub fn wav_resource_from_base64(
    registry: &ResourceRegistry,
    encoded: &str,
) -> Result<ResourceHandle, WavError> {
    let wav = wav::encode_base64_pcm(encoded)?;
    Ok(registry.register(WAV_CONTENT_TYPE, wav))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_resource_from_base64_registers_wav() {
        let registry = ResourceRegistry::new();
        let handle = wav_resource_from_base64(&registry, "AQIDBA==").unwrap();
        assert_eq!(handle.content_type(), "audio/wav");
        let bytes = handle.bytes().unwrap();
        assert_eq!(bytes.len(), 48);
        assert_eq!(&bytes[0..4], b"RIFF");
    }

    #[test]
    fn test_wav_resource_from_invalid_base64_registers_nothing() {
        let registry = ResourceRegistry::new();
        assert!(wav_resource_from_base64(&registry, "%%%").is_err());
        assert!(registry.is_empty());
    }
}
