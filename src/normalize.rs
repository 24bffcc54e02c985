use crate::provider::{ProviderRecord, Provenance};
use crate::tabular::RawRow;

/// Positional layout of the CMS Doctors & Clinicians national file. The
/// mapping is by index, not header name, because that is what the observed
/// export guarantees; a column-count change upstream shows up as rejected
/// rows, not wrong data.
mod columns {
    pub const NPI: usize = 0;
    pub const LAST_NAME: usize = 3;
    pub const FIRST_NAME: usize = 4;
    pub const CREDENTIALS: usize = 8;
    pub const PRIMARY_SPECIALTY: usize = 11;
    pub const SECONDARY_SPECIALTY: usize = 12;
    pub const ADDRESS_LINE_1: usize = 21;
    pub const CITY: usize = 24;
    pub const STATE: usize = 25;
    pub const ZIP_CODE: usize = 26;
    pub const TELEPHONE: usize = 27;
}

/// Maps one raw row into a provider record, trimming every field.
///
/// Returns `None` when the row fails the record invariant (a name plus at
/// least one of specialty or city). That is a common outcome for malformed
/// rows, not an error. Coordinates start unset; geocoding is lazy and
/// happens elsewhere.
pub fn normalize(row: &RawRow) -> Option<ProviderRecord> {
    let field = |i: usize| row.fields.get(i).map(|s| s.trim()).unwrap_or("");
    let opt = |i: usize| {
        let v = field(i);
        (!v.is_empty()).then(|| v.to_string())
    };

    let first = field(columns::FIRST_NAME);
    let last = field(columns::LAST_NAME);
    let name = match (first.is_empty(), last.is_empty()) {
        (true, true) => return None,
        (true, false) => last.to_string(),
        (false, true) => first.to_string(),
        (false, false) => format!("{first} {last}"),
    };

    let primary_specialty = field(columns::PRIMARY_SPECIALTY).to_string();
    let city = field(columns::CITY).to_string();
    if primary_specialty.is_empty() && city.is_empty() {
        return None;
    }

    let npi = field(columns::NPI);
    let id = if npi.is_empty() {
        format!("row-{}", row.line_number)
    } else {
        format!("cms-{npi}")
    };

    Some(ProviderRecord {
        id,
        name,
        credentials: opt(columns::CREDENTIALS),
        primary_specialty,
        secondary_specialty: opt(columns::SECONDARY_SPECIALTY),
        address: opt(columns::ADDRESS_LINE_1),
        city,
        state: field(columns::STATE).to_string(),
        postal_code: opt(columns::ZIP_CODE),
        coordinates: None,
        phone: opt(columns::TELEPHONE),
        rating: None,
        experience_years: None,
        conditions: Vec::new(),
        languages: Vec::new(),
        insurance: Vec::new(),
        telemedicine: false,
        availability_days: None,
        source: Provenance::CsvGovernment,
        is_verified_real: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(fields: Vec<&str>) -> RawRow {
        RawRow {
            fields: fields.into_iter().map(str::to_string).collect(),
            line_number: 1,
        }
    }

    fn wide(set: &[(usize, &str)]) -> RawRow {
        let mut fields = vec![String::new(); 30];
        for (i, v) in set {
            fields[*i] = (*v).to_string();
        }
        RawRow {
            fields,
            line_number: 7,
        }
    }

    #[test]
    fn round_trip_preserves_trimmed_tokens() {
        let row = wide(&[
            (columns::NPI, " 1234567890 "),
            (columns::LAST_NAME, "CHEN "),
            (columns::FIRST_NAME, " SARAH"),
            (columns::CREDENTIALS, "MD"),
            (columns::PRIMARY_SPECIALTY, "CARDIOLOGY"),
            (columns::CITY, "RICHMOND"),
            (columns::STATE, "VA"),
            (columns::ZIP_CODE, "23220"),
            (columns::TELEPHONE, "555-0100"),
        ]);
        let rec = normalize(&row).unwrap();
        assert_eq!(rec.id, "cms-1234567890");
        assert_eq!(rec.name, "SARAH CHEN");
        assert_eq!(rec.credentials.as_deref(), Some("MD"));
        assert_eq!(rec.primary_specialty, "CARDIOLOGY");
        assert_eq!(rec.city, "RICHMOND");
        assert_eq!(rec.state, "VA");
        assert_eq!(rec.postal_code.as_deref(), Some("23220"));
        assert_eq!(rec.source, Provenance::CsvGovernment);
        assert!(rec.is_verified_real);
        assert!(rec.coordinates.is_none());
    }

    #[test]
    fn nameless_row_is_dropped() {
        let row = wide(&[(columns::PRIMARY_SPECIALTY, "CARDIOLOGY")]);
        assert!(normalize(&row).is_none());
    }

    #[test]
    fn name_without_specialty_or_city_is_dropped() {
        let row = wide(&[(columns::FIRST_NAME, "SARAH"), (columns::LAST_NAME, "CHEN")]);
        assert!(normalize(&row).is_none());
    }

    #[test]
    fn city_alone_satisfies_the_invariant() {
        let row = wide(&[(columns::LAST_NAME, "CHEN"), (columns::CITY, "RICHMOND")]);
        let rec = normalize(&row).unwrap();
        assert_eq!(rec.name, "CHEN");
        assert!(rec.primary_specialty.is_empty());
    }

    #[test]
    fn missing_npi_falls_back_to_line_number_id() {
        let row = wide(&[(columns::LAST_NAME, "CHEN"), (columns::CITY, "RICHMOND")]);
        assert_eq!(normalize(&row).unwrap().id, "row-7");
    }

    #[test]
    fn short_row_reads_as_empty_fields() {
        // The parser normally rejects these, but the normalizer must not
        // panic if handed one.
        assert!(normalize(&raw(vec!["1234567890", "x"])).is_none());
    }
}
