//! CSV decoding strategy: delimiter sniffing, lazy row iteration, and the
//! row-to-[`Wave`] parsing rules.

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};

use crate::error::HolterError;
use crate::wave::{Wave, WaveTag, WaveTiming, WaveType};

/// What to do with the rest of a row once an unrecognized tag is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagPolicy {
    /// Drop the unrecognized tag and every tag after it on the row.
    #[default]
    TruncateAtUnknown,
    /// Drop only the unrecognized tag and keep parsing the rest.
    SkipUnknown,
}

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

fn sniff_delimiter(sample: &str) -> u8 {
    for &candidate in &DELIMITER_CANDIDATES {
        if sample.contains(candidate as char) {
            return candidate;
        }
    }
    b','
}

/// Lazy reader over the rows of one CSV wave record.
///
/// The first line is consumed once to sniff the delimiter, then the source
/// is rewound so that line is decoded as data like any other.
pub struct CsvWaveReader<R: Read + Seek> {
    records: StringRecordsIntoIter<R>,
    policy: TagPolicy,
}

impl<R: Read + Seek> std::fmt::Debug for CsvWaveReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvWaveReader")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<R: Read + Seek> CsvWaveReader<R> {
    pub fn new(source: R) -> Result<Self, HolterError> {
        Self::with_policy(source, TagPolicy::default())
    }

    pub fn with_policy(mut source: R, policy: TagPolicy) -> Result<Self, HolterError> {
        let mut sample = String::new();
        BufReader::new(&mut source).read_line(&mut sample)?;
        if sample.is_empty() {
            log::error!("record source is empty");
            return Err(HolterError::EmptyInput);
        }
        source.seek(SeekFrom::Start(0))?;

        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(sniff_delimiter(&sample))
            .from_reader(source);
        Ok(Self {
            records: reader.into_records(),
            policy,
        })
    }
}

impl<R: Read + Seek> Iterator for CsvWaveReader<R> {
    type Item = Result<Wave, HolterError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        log::debug!("wave record = {:?}", record);
        Some(parse_record(&record, self.policy))
    }
}

/// Decode one `TYPE,ONSET,OFFSET[,TAG]*` row.
///
/// An unknown type or a malformed timing field fails the row (and with it
/// the whole pass); an unknown tag is only logged, with [`TagPolicy`]
/// deciding how much of the remaining tag list survives.
pub fn parse_record(record: &StringRecord, policy: TagPolicy) -> Result<Wave, HolterError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    if record.len() < 3 {
        return Err(HolterError::TruncatedRecord {
            line,
            count: record.len(),
        });
    }

    let kind = WaveType::from_label(&record[0]).ok_or_else(|| HolterError::UnknownWaveType {
        line,
        label: record[0].to_string(),
    })?;
    let onset = parse_timing(&record[1], "onset", line)?;
    let offset = parse_timing(&record[2], "offset", line)?;

    let mut tags = Vec::new();
    for label in record.iter().skip(3) {
        match WaveTag::from_label(label) {
            Some(tag) => tags.push(tag),
            None => {
                log::warn!("line {}: unknown tag {:?}", line, label);
                if policy == TagPolicy::TruncateAtUnknown {
                    break;
                }
            }
        }
    }

    Ok(Wave::new(kind, WaveTiming { onset, offset }, tags))
}

fn parse_timing(raw: &str, field: &'static str, line: u64) -> Result<f64, HolterError> {
    raw.trim()
        .parse()
        .map_err(|_| HolterError::InvalidTiming {
            line,
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &str) -> Result<Vec<Wave>, HolterError> {
        CsvWaveReader::new(Cursor::new(input.to_string()))?.collect()
    }

    #[test]
    fn empty_source_is_rejected_at_open() {
        let err = CsvWaveReader::new(Cursor::new(String::new())).err().unwrap();
        assert!(matches!(err, HolterError::EmptyInput));
    }

    #[test]
    fn single_row_round_trips() {
        let waves = read_all("INV,92,248").unwrap();
        assert_eq!(waves.len(), 1);
        assert_eq!(waves[0].kind, WaveType::Inv);
        assert_eq!(waves[0].timing.onset, 92.0);
        assert_eq!(waves[0].timing.offset, 248.0);
        assert!(waves[0].tags.is_empty());
    }

    #[test]
    fn tagged_row_round_trips() {
        let waves = read_all("QRS,7221,7316,junctional").unwrap();
        assert_eq!(waves[0].kind, WaveType::Qrs);
        assert_eq!(waves[0].timing.onset, 7221.0);
        assert_eq!(waves[0].timing.offset, 7316.0);
        assert_eq!(waves[0].tags, vec![WaveTag::Junctional]);
    }

    #[test]
    fn semicolon_delimiter_is_sniffed() {
        let waves = read_all("QRS;964;1055;premature\nT;1055;1339").unwrap();
        assert_eq!(waves.len(), 2);
        assert_eq!(waves[0].tags, vec![WaveTag::Premature]);
        assert_eq!(waves[1].kind, WaveType::T);
    }

    #[test]
    fn unknown_tag_is_dropped_not_fatal() {
        let waves = read_all("P,129,166,unknown-tag").unwrap();
        assert_eq!(waves[0].kind, WaveType::P);
        assert_eq!(waves[0].timing.onset, 129.0);
        assert!(waves[0].tags.is_empty());
    }

    #[test]
    fn truncate_policy_drops_tags_after_the_unknown_one() {
        let waves = read_all("QRS,964,1055,premature,unknown-tag,paced").unwrap();
        assert_eq!(waves[0].tags, vec![WaveTag::Premature]);
    }

    #[test]
    fn skip_policy_keeps_tags_after_the_unknown_one() {
        let reader = CsvWaveReader::with_policy(
            Cursor::new("QRS,964,1055,premature,unknown-tag,paced".to_string()),
            TagPolicy::SkipUnknown,
        )
        .unwrap();
        let waves: Vec<Wave> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(waves[0].tags, vec![WaveTag::Premature, WaveTag::Paced]);
    }

    #[test]
    fn unknown_wave_type_aborts_the_pass() {
        let err = read_all("P,129,166\nXYZ,200,300").err().unwrap();
        assert!(matches!(
            err,
            HolterError::UnknownWaveType { line: 2, ref label } if label == "XYZ"
        ));
    }

    #[test]
    fn malformed_timing_aborts_the_pass() {
        let err = read_all("QRS,abc,300").err().unwrap();
        assert!(matches!(
            err,
            HolterError::InvalidTiming { field: "onset", .. }
        ));
    }

    #[test]
    fn short_row_aborts_the_pass() {
        let err = read_all("QRS,964").err().unwrap();
        assert!(matches!(err, HolterError::TruncatedRecord { count: 2, .. }));
    }

    #[test]
    fn first_line_is_not_skipped_by_sniffing() {
        let waves = read_all("P,129,166\nQRS,964,1055").unwrap();
        assert_eq!(waves.len(), 2);
        assert_eq!(waves[0].kind, WaveType::P);
    }
}
