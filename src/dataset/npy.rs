// NPY container - minimal NumPy array format support
//
// Feature arrays are persisted as little-endian f32 NPY v1.0 files so
// intermediate artifacts stay inspectable with standard numeric tooling.
// Only the f32 subset the pipeline needs is implemented.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::PipelineError;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// An n-dimensional f32 array with its shape
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl NpyArray {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { shape, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Write an f32 array as NPY v1.0
///
/// The write goes to a temporary sibling file first and is renamed into
/// place, so a cancelled run never leaves a torn artifact.
pub fn write_npy(path: &Path, array: &NpyArray) -> Result<(), PipelineError> {
    let tmp_path = path.with_extension("npy.tmp");
    {
        let file = File::create(&tmp_path).map_err(|source| PipelineError::Artifact {
            context: format!("creating {}", tmp_path.display()),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        write_into(&mut writer, array).map_err(|source| PipelineError::Artifact {
            context: format!("writing {}", tmp_path.display()),
            source,
        })?;
    }
    std::fs::rename(&tmp_path, path).map_err(|source| PipelineError::Artifact {
        context: format!("renaming {} into place", path.display()),
        source,
    })
}

fn write_into<W: Write>(writer: &mut W, array: &NpyArray) -> std::io::Result<()> {
    let shape = match array.shape.len() {
        1 => format!("({},)", array.shape[0]),
        _ => {
            let dims: Vec<String> = array.shape.iter().map(usize::to_string).collect();
            format!("({})", dims.join(", "))
        }
    };
    let header = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': {}, }}",
        shape
    );

    // Pad so magic + version + length field + header + newline aligns to 64
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_len = (header.len() + padding + 1) as u16;

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(header.as_bytes())?;
    writer.write_all(&vec![b' '; padding])?;
    writer.write_all(b"\n")?;

    for &value in &array.data {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

/// Load an f32 NPY file
pub fn read_npy(path: &Path) -> Result<NpyArray, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::Artifact {
        context: format!("opening {}", path.display()),
        source,
    })?;
    let mut reader = BufReader::new(file);
    read_from(&mut reader).map_err(|source| PipelineError::Artifact {
        context: format!("reading {}", path.display()),
        source,
    })
}

fn read_from<R: Read>(reader: &mut R) -> std::io::Result<NpyArray> {
    let invalid = |msg: &str| std::io::Error::new(std::io::ErrorKind::InvalidData, msg.to_string());

    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(invalid("invalid NPY magic number"));
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    if version[0] != 1 {
        return Err(invalid("unsupported NPY version"));
    }

    let mut len_bytes = [0u8; 2];
    reader.read_exact(&mut len_bytes)?;
    let header_len = u16::from_le_bytes(len_bytes) as usize;

    let mut header_bytes = vec![0u8; header_len];
    reader.read_exact(&mut header_bytes)?;
    let header = String::from_utf8_lossy(&header_bytes);

    if !header.contains("'<f4'") {
        return Err(invalid("expected little-endian float32 dtype"));
    }
    if header.contains("'fortran_order': True") {
        return Err(invalid("fortran-order arrays are not supported"));
    }

    let shape = parse_shape(&header).ok_or_else(|| invalid("malformed NPY shape"))?;

    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    let expected: usize = shape.iter().product();
    if raw.len() != expected * 4 {
        return Err(invalid("NPY payload size does not match shape"));
    }

    let data: Vec<f32> = raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(NpyArray { shape, data })
}

fn parse_shape(header: &str) -> Option<Vec<usize>> {
    let start = header.find("'shape':")?;
    let open = header[start..].find('(')? + start;
    let close = header[open..].find(')')? + open;
    header[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().ok())
        .collect()
}
