//! Survey CSV loader
//!
//! Columns are located by header name, so their order does not matter and
//! unrelated columns (timestamp, respondent name, gender...) are ignored. Each
//! field accepts its internal name, the cleaned-survey name and the raw form
//! question; matching is case-insensitive and whitespace-tolerant.
//!
//! Only the venue column is mandatory. Any other missing column leaves that
//! field absent on every row, and the normalizer defaults it.

use crate::error::PipelineError;
use crate::model::RawObservation;
use csv_async::{AsyncReaderBuilder, StringRecord, Trim};
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncRead;
use tracing::{debug, info};

const VENUE: &[&str] = &["venue", "tempat_makan", "nama_awal", "nama tempat makan"];
const OTHER_VENUE: &[&str] = &[
    "other_venue",
    "nama_warung_lainnya",
    "nama_lainnya",
    "nama warung (jika memilih lainnya)",
];
const PRICE: &[&str] = &[
    "price",
    "biaya",
    "harga",
    "berapa rata-rata biaya yang kamu habiskan untuk sekali makan + minum? (tulis angka saja, misal: 15000)",
];
const DISTANCE: &[&str] = &[
    "distance",
    "jarak_meter",
    "jarak",
    "jarak dari fasilkom ke tempat itu (tulis dalam meter, misal 5000)",
];
const TASTE: &[&str] = &[
    "taste",
    "rating_rasa",
    "rasa",
    "seberapa enak makanannya menurut kamu?",
];
const COMFORT: &[&str] = &[
    "comfort",
    "rating_nyaman",
    "nyaman",
    "seberapa nyaman tempat ini untuk nongkrong lama?",
];
const WIFI: &[&str] = &["wifi", "adakah wifinya?"];
const OUTLET: &[&str] = &["outlet", "colokan", "ketersediaan colokan listrik"];
const WAIT: &[&str] = &[
    "wait",
    "waktu_tunggu",
    "waktu_saji",
    "berapa lama rata-rata makanan datang setelah dipesan?",
];

/// Lowercased header with runs of whitespace collapsed
fn header_key(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Position of each field's column in the input
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMap {
    venue: usize,
    other_venue: Option<usize>,
    price: Option<usize>,
    distance: Option<usize>,
    taste: Option<usize>,
    comfort: Option<usize>,
    wifi: Option<usize>,
    outlet: Option<usize>,
    wait: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, PipelineError> {
        let keys: Vec<String> = headers.iter().map(header_key).collect();
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| keys.iter().position(|k| k == alias))
        };

        let map = Self {
            venue: find(VENUE).ok_or_else(|| PipelineError::MissingColumn("venue".to_string()))?,
            other_venue: find(OTHER_VENUE),
            price: find(PRICE),
            distance: find(DISTANCE),
            taste: find(TASTE),
            comfort: find(COMFORT),
            wifi: find(WIFI),
            outlet: find(OUTLET),
            wait: find(WAIT),
        };
        debug!(columns = ?map, "Input columns mapped");
        Ok(map)
    }

    fn observation(&self, record: &StringRecord) -> RawObservation {
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::to_string);
        RawObservation {
            venue: record.get(self.venue).unwrap_or_default().to_string(),
            other_venue: cell(self.other_venue),
            price: cell(self.price),
            distance: cell(self.distance),
            taste: cell(self.taste),
            comfort: cell(self.comfort),
            wifi: cell(self.wifi),
            outlet: cell(self.outlet),
            wait: cell(self.wait),
        }
    }
}

/// Read observations from any async CSV source
pub async fn read_observations<R>(reader: R) -> Result<Vec<RawObservation>, PipelineError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut reader = AsyncReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .create_reader(reader);

    let columns = ColumnMap::from_headers(reader.headers().await?)?;

    let mut observations = Vec::new();
    let mut records = reader.records();
    while let Some(record) = records.next().await {
        observations.push(columns.observation(&record?));
    }
    Ok(observations)
}

/// Read observations from a CSV file
///
/// A file that does not exist is [`PipelineError::MissingInput`].
pub async fn load_observations(path: &Path) -> Result<Vec<RawObservation>, PipelineError> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::MissingInput {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let observations = read_observations(file).await?;
    info!(
        "Loaded {} observations from {}",
        observations.len(),
        path.display()
    );
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_internal_headers() {
        let csv = "venue,price,distance,taste\nKulos,12000,500,4.8\n";
        let rows = read_observations(csv.as_bytes()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].venue, "Kulos");
        assert_eq!(rows[0].price.as_deref(), Some("12000"));
        assert_eq!(rows[0].comfort, None);
    }

    #[tokio::test]
    async fn test_raw_form_headers_and_ignored_columns() {
        let csv = "Timestamp,Nama,Nama tempat makan,Nama warung (Jika memilih lainnya),\
\"Berapa rata-rata biaya yang kamu habiskan untuk sekali makan + minum? (Tulis angka saja, misal: 15000)\",\
Adakah wifinya?,Ketersediaan Colokan Listrik\n\
2024-01-01,Ani,Lainnya,  mie ayam ,15000,Ada dan cepat,Tidak ada\n";
        let rows = read_observations(csv.as_bytes()).await.unwrap();
        assert_eq!(rows[0].venue, "Lainnya");
        assert_eq!(rows[0].other_venue.as_deref(), Some("mie ayam"));
        assert_eq!(rows[0].price.as_deref(), Some("15000"));
        assert_eq!(rows[0].wifi.as_deref(), Some("Ada dan cepat"));
        assert_eq!(rows[0].outlet.as_deref(), Some("Tidak ada"));
        assert_eq!(rows[0].wait, None);
    }

    #[tokio::test]
    async fn test_missing_venue_column() {
        let csv = "price,taste\n12000,4.8\n";
        let err = read_observations(csv.as_bytes()).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(_)));
    }

    #[test]
    fn test_header_key_normalises() {
        assert_eq!(header_key("  Rating_Rasa "), "rating_rasa");
        assert_eq!(header_key("Nama   tempat\tmakan"), "nama tempat makan");
    }
}
