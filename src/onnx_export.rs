//! ONNX export: run the external exporter, attach detector metadata to the
//! exported model, then simplify and quantize it with external tools.
//!
//! Metadata lives in `ModelProto.metadata_props` (field 14). Protobuf merges
//! repeated fields on concatenation, so properties are attached by rewriting
//! only the top-level field 14 entries and leaving every other byte of the
//! model untouched.

use log::{debug, info};
use prost::bytes::Buf;
use prost::encoding::{decode_key, decode_varint, WireType};
use prost::Message;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::ExportArgs;
use crate::error::{LabelError, Result};

pub const METADATA_PROPS_TAG: u32 = 14;

pub const DEFAULT_QUANTIZER: &str = "python -c \"import sys; from onnxruntime.quantization import quantize_dynamic, QuantType; quantize_dynamic(sys.argv[1], sys.argv[2], weight_type=QuantType.QUInt8)\" {input} {output}";

/// `onnx.StringStringEntryProto`
#[derive(Clone, PartialEq, Message)]
pub struct StringStringEntry {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

// Only the metadata field of `onnx.ModelProto`, other fields are skipped
#[derive(Clone, PartialEq, Message)]
struct ModelMetadata {
    #[prost(message, repeated, tag = "14")]
    metadata_props: Vec<StringStringEntry>,
}

/// Descriptive metadata attached to an exported detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorMetadata {
    pub model_type: String,
    pub det_iou_thresh: f64,
    pub det_type: String,
    pub resolution: u32,
    pub class_names: BTreeMap<String, String>,
    pub det_conf: f64,
    pub tiles_overlap: u32,
}

impl Default for DetectorMetadata {
    fn default() -> Self {
        Self {
            model_type: "Detector".to_string(),
            det_iou_thresh: 0.3,
            det_type: "YOLO_v8".to_string(),
            resolution: 10,
            class_names: BTreeMap::from([("0".to_string(), "tree".to_string())]),
            det_conf: 0.3,
            tiles_overlap: 5,
        }
    }
}

impl DetectorMetadata {
    pub fn from_args(args: &ExportArgs) -> Self {
        Self {
            model_type: "Detector".to_string(),
            det_iou_thresh: args.det_iou_thresh,
            det_type: args.det_type.clone(),
            resolution: args.resolution,
            class_names: args
                .class_names
                .iter()
                .enumerate()
                .map(|(id, name)| (id.to_string(), name.clone()))
                .collect(),
            det_conf: args.det_conf,
            tiles_overlap: args.tiles_overlap,
        }
    }

    /// Metadata properties in declaration order, each value JSON encoded.
    pub fn to_properties(&self) -> Result<Vec<(String, String)>> {
        let value = serde_json::to_value(self)?;
        let fields = [
            "model_type",
            "det_iou_thresh",
            "det_type",
            "resolution",
            "class_names",
            "det_conf",
            "tiles_overlap",
        ];
        fields
            .iter()
            .map(|key| Ok((key.to_string(), to_spaced_json(&value[*key])?)))
            .collect()
    }
}

// JSON with `", "` and `": "` separators, the way Python's `json.dumps` writes it
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn to_spaced_json(value: &serde_json::Value) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Read the metadata properties of a serialized ONNX model.
pub fn read_metadata(model: &[u8]) -> Result<Vec<(String, String)>> {
    Ok(ModelMetadata::decode(model)?
        .metadata_props
        .into_iter()
        .map(|entry| (entry.key, entry.value))
        .collect())
}

/// Byte length of the value of a top-level field with `wire_type`.
fn field_value_len(wire_type: WireType, buf: &mut &[u8]) -> Result<usize> {
    let len = match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
            0
        }
        WireType::SixtyFourBit => 8,
        WireType::ThirtyTwoBit => 4,
        WireType::LengthDelimited => decode_varint(buf)? as usize,
        WireType::StartGroup | WireType::EndGroup => {
            return Err(LabelError::MalformedModel(
                "unexpected group field".to_string(),
            ))
        }
    };
    if len > buf.remaining() {
        return Err(LabelError::MalformedModel(
            "field length exceeds model size".to_string(),
        ));
    }
    Ok(len)
}

/// Attach `properties` to a serialized ONNX model.
///
/// Existing properties with the same keys are removed; all other fields are
/// copied verbatim and the new entries are appended at the end.
pub fn attach_metadata(model: &[u8], properties: &[(String, String)]) -> Result<Vec<u8>> {
    let keys: HashSet<&str> = properties.iter().map(|(key, _)| key.as_str()).collect();
    let mut output = Vec::with_capacity(model.len() + properties.len() * 32);
    let mut buf = model;

    while buf.has_remaining() {
        let field_start = model.len() - buf.remaining();
        let (tag, wire_type) = decode_key(&mut buf)?;
        let value_len = field_value_len(wire_type, &mut buf)?;
        let value_start = model.len() - buf.remaining();
        let field_end = value_start + value_len;
        let value = &model[value_start..field_end];
        buf.advance(value_len);

        if tag == METADATA_PROPS_TAG && wire_type == WireType::LengthDelimited {
            let entry = StringStringEntry::decode(value)?;
            if keys.contains(entry.key.as_str()) {
                debug!("Replacing metadata property {}", entry.key);
                continue;
            }
        }
        output.extend_from_slice(&model[field_start..field_end]);
    }

    let metadata = ModelMetadata {
        metadata_props: properties
            .iter()
            .map(|(key, value)| StringStringEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect(),
    };
    metadata
        .encode(&mut output)
        .map_err(|e| LabelError::MalformedModel(e.to_string()))?;
    Ok(output)
}

/// Attach metadata to the model file at `path`, rewriting it in place.
pub fn attach_metadata_to_file(path: &Path, metadata: &DetectorMetadata) -> Result<()> {
    let model = fs::read(path)?;
    let properties = metadata.to_properties()?;
    let updated = attach_metadata(&model, &properties)?;
    fs::write(path, updated)?;
    Ok(())
}

/// An external command line with `{input}` and `{output}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    pub name: &'static str,
    pub template: String,
}

impl ExternalTool {
    pub fn new(name: &'static str, template: impl Into<String>) -> Self {
        Self {
            name,
            template: template.into(),
        }
    }

    /// Program and arguments with placeholders substituted.
    pub fn command_line(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        split_command(&self.template)
            .into_iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }

    pub fn run(&self, input: &Path, output: &Path) -> Result<()> {
        let command_line = self.command_line(input, output);
        let (program, args) = command_line.split_first().ok_or_else(|| LabelError::Command {
            command: self.name.to_string(),
            reason: "empty command".to_string(),
        })?;

        info!("Running {}: {}", self.name, command_line.join(" "));
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| LabelError::Command {
                command: command_line.join(" "),
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(LabelError::Command {
                command: command_line.join(" "),
                reason: format!("exited with {}", status),
            });
        }
        Ok(())
    }
}

/// Split a command template on whitespace, keeping double-quoted runs together.
pub fn split_command(template: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in template.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }
    args
}

/// Output paths derived from the weights path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub model: PathBuf,
    pub optimized: PathBuf,
    pub quantized: PathBuf,
}

impl ExportPaths {
    pub fn for_weights(weights: &Path) -> Self {
        let stem = weights.with_extension("");
        let with_suffix = |suffix: &str| {
            let mut path = stem.clone().into_os_string();
            path.push(suffix);
            PathBuf::from(path)
        };
        Self {
            model: with_suffix(".onnx"),
            optimized: with_suffix(".optim.onnx"),
            quantized: with_suffix(".quant.onnx"),
        }
    }
}

/// Run the whole export pipeline for `args.input`.
pub fn export_model(args: &ExportArgs) -> Result<ExportPaths> {
    let paths = ExportPaths::for_weights(&args.input);

    ExternalTool::new("exporter", args.exporter.as_str()).run(&args.input, &paths.model)?;
    if !paths.model.is_file() {
        return Err(LabelError::Command {
            command: args.exporter.clone(),
            reason: format!("expected output {} was not created", paths.model.display()),
        });
    }

    attach_metadata_to_file(&paths.model, &DetectorMetadata::from_args(args))?;

    if !args.skip_simplify {
        ExternalTool::new("simplifier", args.simplifier.as_str()).run(&paths.model, &paths.model)?;
    }
    info!("Wrote {}", paths.model.display());

    ExternalTool::new("preprocessor", args.preprocessor.as_str())
        .run(&paths.model, &paths.optimized)?;
    ExternalTool::new("quantizer", args.quantizer.as_str())
        .run(&paths.optimized, &paths.quantized)?;
    fs::remove_file(&paths.optimized)?;

    info!("Wrote {}", paths.quantized.display());
    Ok(paths)
}
