//! Incident CSV reading.

use std::collections::BTreeMap;
use std::io::Read;

use incident_map_incident_models::{IncidentPoint, IncidentRecord};
use incident_map_ingest_models::{ColumnMapping, IngestReport};
use incident_map_projection::{SourceFrame, transform};

use crate::IngestError;

/// Header positions of the mapped columns.
struct ColumnIndices {
    x: usize,
    y: usize,
    category: usize,
    group: usize,
    type_group: usize,
}

impl ColumnIndices {
    fn resolve(headers: &[String], columns: &ColumnMapping) -> Result<Self, IngestError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| IngestError::MissingColumn {
                    column: column.to_string(),
                })
        };

        Ok(Self {
            x: find(&columns.x)?,
            y: find(&columns.y)?,
            category: find(&columns.category)?,
            group: find(&columns.group)?,
            type_group: find(&columns.type_group)?,
        })
    }

    fn is_mapped(&self, index: usize) -> bool {
        [self.x, self.y, self.category, self.group, self.type_group].contains(&index)
    }
}

/// Reads incidents from CSV and converts their coordinates from `frame`
/// to longitude/latitude.
///
/// Rows that are malformed, have unparseable x/y values, or fail to
/// transform are skipped and counted as rejected. Unmapped columns are
/// kept in [`IncidentRecord::extra`].
///
/// # Errors
///
/// * If the header row cannot be read
/// * If a mapped column is absent from the header row
pub fn read_incidents(
    reader: impl Read,
    columns: &ColumnMapping,
    frame: SourceFrame,
) -> Result<(Vec<IncidentPoint>, IngestReport), IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();
    let indices = ColumnIndices::resolve(&headers, columns)?;

    let mut points = Vec::new();
    let mut report = IngestReport::default();

    for (row, result) in reader.records().enumerate() {
        report.read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::trace!("  skipping malformed row {row}: {e}");
                report.rejected += 1;
                continue;
            }
        };

        let field = |index: usize| record.get(index).unwrap_or("").trim();

        let (Ok(x), Ok(y)) = (field(indices.x).parse::<f64>(), field(indices.y).parse::<f64>())
        else {
            log::trace!(
                "  skipping row {row}: unparseable coordinates ({:?}, {:?})",
                field(indices.x),
                field(indices.y)
            );
            report.rejected += 1;
            continue;
        };

        let (longitude, latitude) = match transform(x, y, frame) {
            Ok(lon_lat) => lon_lat,
            Err(e) => {
                log::trace!("  skipping row {row}: {e}");
                report.rejected += 1;
                continue;
            }
        };

        let extra: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.is_mapped(*i))
            .map(|(i, header)| (header.clone(), field(i).to_owned()))
            .collect();

        points.push(IncidentPoint {
            record: IncidentRecord {
                x,
                y,
                frame,
                category: field(indices.category).to_owned(),
                group: field(indices.group).to_owned(),
                type_group: field(indices.type_group).to_owned(),
                extra,
            },
            longitude,
            latitude,
        });
    }

    if report.rejected > 0 {
        log::warn!(
            "Rejected {} of {} incident rows in {frame}",
            report.rejected,
            report.read
        );
    }

    Ok((points, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> ColumnMapping {
        ColumnMapping {
            x: "x".to_string(),
            y: "y".to_string(),
            category: "Occurrence_Category".to_string(),
            group: "Occurrence_Group".to_string(),
            type_group: "Occurrence_Type_Group".to_string(),
        }
    }

    #[test]
    fn reads_web_mercator_rows() {
        let csv = "\
x,y,Occurrence_Category,Occurrence_Group,Occurrence_Type_Group,Reported_Month
-12633749.19767033,7084338.97207928,Property,Theft,Theft From Vehicle,3
0,0,Violent,Assault,Assault,4
";
        let (points, report) =
            read_incidents(csv.as_bytes(), &columns(), SourceFrame::WebMercator).unwrap();

        assert_eq!(report, IngestReport { read: 2, rejected: 0 });
        assert_eq!(points.len(), 2);

        let edmonton = &points[0];
        assert!((edmonton.longitude - -113.4909).abs() < 1e-6);
        assert!((edmonton.latitude - 53.5444).abs() < 1e-6);
        assert_eq!(edmonton.record.category, "Property");
        assert_eq!(edmonton.record.group, "Theft");
        assert_eq!(edmonton.record.type_group, "Theft From Vehicle");
        assert_eq!(edmonton.record.frame, SourceFrame::WebMercator);
        assert_eq!(
            edmonton.record.extra,
            BTreeMap::from([("Reported_Month".to_string(), "3".to_string())])
        );
    }

    #[test]
    fn reads_alberta_3tm_rows() {
        let csv = "\
Occurrence_Category,Occurrence_Group,Occurrence_Type_Group,x,y
Property,Theft,Theft Of Vehicle,33744.58,5934734.47
";
        let (points, report) =
            read_incidents(csv.as_bytes(), &columns(), SourceFrame::Alberta3Tm114).unwrap();
        assert_eq!(report.accepted(), 1);
        assert!((points[0].longitude - -113.4909).abs() < 1e-6);
        assert!((points[0].latitude - 53.5444).abs() < 1e-6);
        assert!(points[0].record.extra.is_empty());
    }

    #[test]
    fn bad_coordinates_are_rejected_and_counted() {
        let csv = "\
x,y,Occurrence_Category,Occurrence_Group,Occurrence_Type_Group
,,Property,Theft,Theft From Vehicle
abc,1,Property,Theft,Theft From Vehicle
NaN,1,Property,Theft,Theft From Vehicle
1,2,Property,Theft,Theft From Vehicle
";
        let (points, report) =
            read_incidents(csv.as_bytes(), &columns(), SourceFrame::Geographic).unwrap();
        assert_eq!(report, IngestReport { read: 4, rejected: 3 });
        assert_eq!(points.len(), 1);
        assert!((points[0].longitude - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_rows_get_empty_attributes() {
        let csv = "\
x,y,Occurrence_Category,Occurrence_Group,Occurrence_Type_Group
1,2,Property
";
        let (points, _) =
            read_incidents(csv.as_bytes(), &columns(), SourceFrame::Geographic).unwrap();
        assert_eq!(points[0].record.category, "Property");
        assert_eq!(points[0].record.type_group, "");
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "x,y,Occurrence_Category\n1,2,Property\n";
        let err = read_incidents(csv.as_bytes(), &columns(), SourceFrame::Geographic).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn { column } if column == "Occurrence_Group"
        ));
    }
}
