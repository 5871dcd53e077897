//! Hardhat compilation artifacts.

use {
    crate::domain::{
        deployment::{Contract, Source},
        eth,
    },
    alloy::{
        dyn_abi::{DynSolType, DynSolValue, Specifier},
        json_abi::JsonAbi,
    },
    serde::Deserialize,
    std::{
        fs,
        path::{Path, PathBuf},
    },
    thiserror::Error,
};

/// A compiled contract as written by `hardhat compile` to
/// `<artifacts>/<source>/<Name>.sol/<Name>.json`.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub contract_name: String,
    pub abi: JsonAbi,
    pub bytecode: eth::Bytes,
    pub source: Option<Source>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    contract_name: String,
    source_name: String,
    abi: JsonAbi,
    bytecode: eth::Bytes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    solc_long_version: String,
    input: serde_json::Value,
}

impl Artifact {
    /// Searches `dir` recursively for the artifact of the contract `name`.
    pub fn find(dir: &Path, name: &str) -> Result<Self, Error> {
        let file_name = format!("{name}.json");
        let path = find_file(dir, &file_name)?.ok_or_else(|| Error::NotFound {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        })?;
        Self::load(&path)
    }

    /// Loads an artifact file and, when present, the build info referenced
    /// by the `.dbg.json` file next to it.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let artifact: ArtifactFile = read_json(path)?;
        if artifact.bytecode.is_empty() {
            return Err(Error::NotDeployable(artifact.contract_name));
        }
        let source = match debug_path(path) {
            Some(debug) if debug.is_file() => {
                let info: DebugFile = read_json(&debug)?;
                let dir = debug.parent().unwrap_or_else(|| Path::new("."));
                let build_info: BuildInfo = read_json(&dir.join(info.build_info))?;
                Some(Source {
                    fully_qualified_name: format!(
                        "{}:{}",
                        artifact.source_name, artifact.contract_name
                    ),
                    compiler_version: build_info.solc_long_version,
                    standard_json_input: build_info.input,
                })
            }
            _ => None,
        };
        tracing::debug!(
            ?path,
            contract = %artifact.contract_name,
            verifiable = source.is_some(),
            "loaded artifact"
        );
        Ok(Self {
            contract_name: artifact.contract_name,
            abi: artifact.abi,
            bytecode: artifact.bytecode,
            source,
        })
    }

    /// Coerces the textual constructor arguments to the constructor's ABI
    /// types and encodes them.
    pub fn contract(&self, args: &[String]) -> Result<Contract, Error> {
        let params = self
            .abi
            .constructor
            .as_ref()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default();
        if params.len() != args.len() {
            return Err(Error::ArgumentCount {
                expected: params.len(),
                actual: args.len(),
            });
        }
        let values = params
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty: DynSolType = param.resolve()?;
                ty.coerce_str(arg).map_err(|err| Error::Argument {
                    name: param.name.clone(),
                    value: arg.clone(),
                    source: err,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let encoded_args = if values.is_empty() {
            eth::Bytes::new()
        } else {
            DynSolValue::Tuple(values).abi_encode_params().into()
        };
        Ok(Contract {
            name: self.contract_name.clone(),
            constructor_args: args.to_vec(),
            encoded_args,
            bytecode: self.bytecode.clone(),
            source: self.source.clone(),
        })
    }
}

fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>, Error> {
    let entries = fs::read_dir(dir).map_err(|err| Error::Io {
        path: dir.to_path_buf(),
        source: err,
    })?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| Error::Io {
                path: dir.to_path_buf(),
                source: err,
            })?
            .path();
        if path.is_dir() {
            if path.file_name().is_some_and(|name| name != "build-info") {
                dirs.push(path);
            }
        } else if path.file_name().is_some_and(|name| name == file_name) {
            return Ok(Some(path));
        }
    }
    dirs.sort();
    for dir in dirs {
        if let Some(path) = find_file(&dir, file_name)? {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

fn debug_path(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_str()?;
    Some(path.with_file_name(format!("{stem}.dbg.json")))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let data = fs::read_to_string(path).map_err(|err| Error::Io {
        path: path.to_path_buf(),
        source: err,
    })?;
    serde_json::from_str(&data).map_err(|err| Error::Json {
        path: path.to_path_buf(),
        source: err,
    })
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no artifact for contract {name:?} under {dir:?}")]
    NotFound { name: String, dir: PathBuf },
    #[error("contract {0:?} has no creation bytecode")]
    NotDeployable(String),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed artifact {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("constructor takes {expected} arguments but {actual} were given")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("invalid value {value:?} for constructor argument {name:?}: {source}")]
    Argument {
        name: String,
        value: String,
        source: alloy::dyn_abi::Error,
    },
    #[error(transparent)]
    Abi(#[from] alloy::dyn_abi::Error),
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    const BYTECODE: &str = "0x6080604052";

    fn write(path: &Path, value: serde_json::Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, value.to_string()).unwrap();
    }

    fn election(constructor: serde_json::Value) -> serde_json::Value {
        json!({
            "_format": "hh-sol-artifact-1",
            "contractName": "Election",
            "sourceName": "contracts/Election.sol",
            "abi": [constructor],
            "bytecode": BYTECODE,
            "deployedBytecode": "0x",
        })
    }

    fn no_args() -> serde_json::Value {
        json!({ "type": "constructor", "inputs": [], "stateMutability": "nonpayable" })
    }

    #[test]
    fn finds_artifact_with_build_info() {
        let dir = tempfile::tempdir().unwrap();
        let sol = dir.path().join("contracts/Election.sol");
        write(&sol.join("Election.json"), election(no_args()));
        write(
            &sol.join("Election.dbg.json"),
            json!({ "_format": "hh-sol-dbg-1", "buildInfo": "../../build-info/abc.json" }),
        );
        write(
            &dir.path().join("build-info/abc.json"),
            json!({
                "solcLongVersion": "0.8.17+commit.8df45f5f",
                "input": { "language": "Solidity", "sources": {} },
            }),
        );

        let artifact = Artifact::find(dir.path(), "Election").unwrap();
        assert_eq!(artifact.contract_name, "Election");
        assert_eq!(artifact.bytecode.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        let source = artifact.source.unwrap();
        assert_eq!(
            source.fully_qualified_name,
            "contracts/Election.sol:Election"
        );
        assert_eq!(source.compiler_version, "0.8.17+commit.8df45f5f");
        assert_eq!(source.standard_json_input["language"], "Solidity");
    }

    #[test]
    fn missing_debug_file_is_not_verifiable() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("contracts/Election.sol/Election.json"),
            election(no_args()),
        );
        let artifact = Artifact::find(dir.path(), "Election").unwrap();
        assert!(artifact.source.is_none());
    }

    #[test]
    fn unknown_contract() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("contracts/Election.sol/Election.json"),
            election(no_args()),
        );
        assert!(matches!(
            Artifact::find(dir.path(), "Ballot"),
            Err(Error::NotFound { name, .. }) if name == "Ballot"
        ));
    }

    #[test]
    fn encodes_constructor_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Election.json");
        write(
            &path,
            election(json!({
                "type": "constructor",
                "inputs": [{ "name": "candidates", "type": "uint256", "internalType": "uint256" }],
                "stateMutability": "nonpayable",
            })),
        );
        let artifact = Artifact::load(&path).unwrap();

        let contract = artifact.contract(&["2".to_string()]).unwrap();
        let mut expected = vec![0_u8; 32];
        expected[31] = 2;
        assert_eq!(contract.encoded_args.to_vec(), expected);
        assert_eq!(contract.creation_code().len(), 5 + 32);

        assert!(matches!(
            artifact.contract(&[]),
            Err(Error::ArgumentCount {
                expected: 1,
                actual: 0
            })
        ));
        assert!(matches!(
            artifact.contract(&["two".to_string()]),
            Err(Error::Argument { .. })
        ));
    }

    #[test]
    fn no_constructor_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Election.json");
        write(&path, election(no_args()));
        let contract = Artifact::load(&path).unwrap().contract(&[]).unwrap();
        assert!(contract.encoded_args.is_empty());
        assert_eq!(contract.creation_code().to_vec(), contract.bytecode.to_vec());
    }
}
