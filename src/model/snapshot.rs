use crate::model::ContainerGraph;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// A persisted project: the full container graph of one project serialized,
/// gzip-compressed and content-hashed. This is the unit the store saves and
/// loads; the graph inside contains real identifiers only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub name: String,
    pub container_count: i32,
    /// Hex-encoded SHA-256 over the serialized graph, verified on load.
    pub content_hash: String,
    /// Gzip-compressed JSON body of the container graph.
    pub data: Vec<u8>,
    pub saved_at: String, // ISO 8601 timestamp
}

impl ProjectSnapshot {
    pub fn new(name: &str, graph: &ContainerGraph) -> Result<Self> {
        let serialized =
            serde_json::to_string(graph).context("Failed to serialize container graph")?;
        let data = Self::compress_data(serialized.as_bytes());
        let content_hash = Self::calculate_hash(name, &serialized);

        Ok(Self {
            name: name.to_string(),
            container_count: graph.len() as i32,
            content_hash,
            data,
            saved_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Decompress and deserialize the graph, verifying the content hash.
    pub fn get_graph(&self) -> Result<ContainerGraph> {
        let decompressed = Self::decompress_data(&self.data)?;
        let json_str =
            String::from_utf8(decompressed).context("Snapshot body is not valid UTF-8")?;

        let expected = Self::calculate_hash(&self.name, &json_str);
        if expected != self.content_hash {
            return Err(anyhow!(
                "Snapshot for project '{}' failed content hash verification",
                self.name
            ));
        }

        serde_json::from_str(&json_str).context("Failed to deserialize container graph")
    }

    fn calculate_hash(name: &str, data: &str) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(format!("project:{}\n", name));
        hasher.update(format!("data:{}\n", data));

        hex::encode(hasher.finalize())
    }

    fn compress_data(data: &[u8]) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        // Writing to a Vec cannot fail
        encoder.write_all(data).expect("gzip write to Vec failed");
        encoder.finish().expect("gzip finish to Vec failed")
    }

    fn decompress_data(data: &[u8]) -> Result<Vec<u8>> {
        use flate2::read::GzDecoder;
        use std::io::Read;

        // Gzip magic bytes (1f 8b); uncompressed bodies pass through for
        // snapshots written before compression was introduced.
        if data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b {
            let mut decoder = GzDecoder::new(data);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .context("Failed to decompress snapshot body")?;
            Ok(decompressed)
        } else {
            Ok(data.to_vec())
        }
    }
}
