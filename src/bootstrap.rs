//! One-time initialisation of the DICOM stack the viewer depends on.

use dicom::core::dictionary::DataDictionary;
use dicom::dictionary_std::StandardDataDictionary;
use dicom::encoding::transfer_syntax::TransferSyntaxIndex;
use dicom::transfer_syntax::TransferSyntaxRegistry;

use crate::error::BootstrapError;
use crate::tools::ToolKind;

/// Attributes the viewer reads from every slice.
const REQUIRED_ATTRIBUTES: [&str; 6] = [
    "PatientName",
    "WindowCenter",
    "WindowWidth",
    "PixelSpacing",
    "Rows",
    "Columns",
];

const NATIVE_TRANSFER_SYNTAXES: [(&str, &str); 2] = [
    ("1.2.840.10008.1.2", "Implicit VR Little Endian"),
    ("1.2.840.10008.1.2.1", "Explicit VR Little Endian"),
];

const COMPRESSED_TRANSFER_SYNTAXES: [(&str, &str); 4] = [
    ("1.2.840.10008.1.2.4.50", "JPEG Baseline"),
    ("1.2.840.10008.1.2.4.80", "JPEG-LS Lossless"),
    ("1.2.840.10008.1.2.4.90", "JPEG 2000 Lossless"),
    ("1.2.840.10008.1.2.5", "RLE Lossless"),
];

/// The three subsystems, initialised in declaration order.
pub trait Subsystems {
    fn init_core(&mut self) -> Result<(), BootstrapError>;

    fn init_decoding(&mut self) -> Result<(), BootstrapError>;

    fn init_tools(&mut self) -> Result<(), BootstrapError>;
}

#[derive(Debug, Default)]
pub struct Bootstrap {
    initialized: bool,
}

impl Bootstrap {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Runs every subsystem once; later calls return immediately. The first
    /// failure is returned and the next call starts over.
    pub fn initialize<S: Subsystems>(&mut self, subsystems: &mut S) -> Result<(), BootstrapError> {
        if self.initialized {
            log::debug!("Already initialised");
            return Ok(());
        }

        subsystems.init_core()?;
        subsystems.init_decoding()?;
        subsystems.init_tools()?;

        self.initialized = true;
        log::info!("Initialised core, decoding and tools");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DicomSubsystems;

impl Subsystems for DicomSubsystems {
    fn init_core(&mut self) -> Result<(), BootstrapError> {
        let missing: Vec<&str> = REQUIRED_ATTRIBUTES
            .into_iter()
            .filter(|name| StandardDataDictionary.by_name(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(BootstrapError::Core(format!(
                "data dictionary lacks {}",
                missing.join(", ")
            )));
        }
        log::debug!("Data dictionary resolves {} attributes", REQUIRED_ATTRIBUTES.len());
        Ok(())
    }

    fn init_decoding(&mut self) -> Result<(), BootstrapError> {
        for (uid, name) in NATIVE_TRANSFER_SYNTAXES {
            if TransferSyntaxRegistry.get(uid).is_none() {
                return Err(BootstrapError::Decoding(format!(
                    "{name} ({uid}) is not registered"
                )));
            }
        }

        for (uid, name) in COMPRESSED_TRANSFER_SYNTAXES {
            match TransferSyntaxRegistry.get(uid) {
                Some(syntax) if syntax.can_decode_all() => log::info!("{name} decoding available"),
                Some(_) => log::info!("{name} recognised, pixel data not decodable"),
                None => log::info!("{name} not registered"),
            }
        }
        Ok(())
    }

    fn init_tools(&mut self) -> Result<(), BootstrapError> {
        let names: Vec<&str> = ToolKind::ALL.iter().map(|kind| kind.name()).collect();
        log::info!("Tools available: {}", names.join(", "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSubsystems {
        calls: Vec<&'static str>,
        fail_decoding: bool,
    }

    impl Subsystems for CountingSubsystems {
        fn init_core(&mut self) -> Result<(), BootstrapError> {
            self.calls.push("core");
            Ok(())
        }

        fn init_decoding(&mut self) -> Result<(), BootstrapError> {
            self.calls.push("decoding");
            if self.fail_decoding {
                return Err(BootstrapError::Decoding("codec missing".to_string()));
            }
            Ok(())
        }

        fn init_tools(&mut self) -> Result<(), BootstrapError> {
            self.calls.push("tools");
            Ok(())
        }
    }

    #[test]
    fn repeated_initialisation_calls_subsystems_once() {
        let mut bootstrap = Bootstrap::default();
        let mut subsystems = CountingSubsystems::default();

        bootstrap.initialize(&mut subsystems).expect("first call");
        bootstrap.initialize(&mut subsystems).expect("second call");
        bootstrap.initialize(&mut subsystems).expect("third call");

        assert!(bootstrap.is_initialized());
        assert_eq!(subsystems.calls, vec!["core", "decoding", "tools"]);
    }

    #[test]
    fn first_failure_stops_the_sequence() {
        let mut bootstrap = Bootstrap::default();
        let mut subsystems = CountingSubsystems {
            fail_decoding: true,
            ..Default::default()
        };

        let err = bootstrap.initialize(&mut subsystems).expect_err("decoding fails");

        assert_eq!(err.to_string(), "image decoder initialisation failed: codec missing");
        assert!(!bootstrap.is_initialized());
        assert_eq!(subsystems.calls, vec!["core", "decoding"]);
    }

    #[test]
    fn dicom_subsystems_initialise() {
        let mut bootstrap = Bootstrap::default();

        bootstrap
            .initialize(&mut DicomSubsystems)
            .expect("dictionary and native transfer syntaxes are built in");
    }
}
