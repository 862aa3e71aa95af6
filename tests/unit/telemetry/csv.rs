use super::*;

fn load(text: &str) -> FlightLog {
    read_csv(text.as_bytes(), &CsvOptions::default()).unwrap()
}

#[test]
fn metadata_columns_are_not_fields() {
    let log = load(
        "loopIteration, time (us), motor[0], gyroADC[0]\n\
         0, 1000, 1100, -3\n\
         1, 2000, 1200, -2\n",
    );
    assert_eq!(log.field_names(), &["motor[0]".to_string(), "gyroADC[0]".to_string()]);
    assert_eq!(log.frames()[1].iteration, 1);
    assert_eq!(log.frames()[1].time, 2000);
    assert_eq!(log.frames()[1].values, vec![1200.0, -2.0]);
}

#[test]
fn missing_time_column_is_an_error() {
    let err = read_csv("a,b\n1,2\n".as_bytes(), &CsvOptions::default()).unwrap_err();
    assert!(err.to_string().contains("time (us)"));
}

#[test]
fn non_numeric_cells_load_as_nan() {
    let log = load("loopIteration,time (us),flightMode\n0,0,ANGLE\n");
    assert!(log.frames()[0].values[0].is_nan());
}

#[test]
fn iteration_jump_marks_a_gap() {
    let log = load(
        "loopIteration,time (us),x\n\
         0,0,1\n\
         1,1000,1\n\
         2,2000,1\n\
         40,3000,1\n\
         41,4000,1\n",
    );
    let chunk = &log.chunks_in_time_range(0, 4000)[0];
    assert_eq!(chunk.gap_starts_here, vec![false, false, false, true, false]);
}

#[test]
fn time_stall_and_backwards_rows() {
    let log = load(
        "loopIteration,time (us),x\n\
         0,0,1\n\
         1,1000,1\n\
         2,500,1\n\
         3,2000,1\n\
         4,900000,1\n",
    );
    // The backwards row is dropped and breaks the trace.
    assert_eq!(log.frame_count(), 4);
    let chunk = &log.chunks_in_time_range(0, 900_000)[0];
    assert_eq!(chunk.gap_starts_here, vec![false, false, true, true]);
}
