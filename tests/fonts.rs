use guia_export::Error;
use guia_export::fonts::FontSet;

#[test]
fn unknown_family_is_measurement_unavailable() {
    match FontSet::discover("no-such-family-zzz") {
        Err(Error::MeasurementUnavailable(msg)) => {
            assert!(msg.contains("no-such-family-zzz"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("nonexistent family must not resolve"),
    }
}
