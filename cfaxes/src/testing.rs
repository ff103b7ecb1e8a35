use std::cell::RefCell;

use log::{Level, LevelFilter, Log, Metadata, Record};
use ndarray::{array, ArrayD, IxDyn};
use once_cell::sync::Lazy;

use crate::{coordinate::Coordinate, dataset::Dataset, variable::Variable};

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(vec![]);
}

/// Keeps log records on the thread that emitted them, so tests running in parallel each see
/// only their own.
struct CapturingLogger;

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger;

static INSTALL: Lazy<()> = Lazy::new(|| {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
});

/// Run `f`, returning its result along with every record logged on this thread meanwhile.
///
pub(crate) fn capture_logs<F, R>(f: F) -> (R, Vec<(Level, String)>)
where
    F: FnOnce() -> R,
{
    Lazy::force(&INSTALL);
    RECORDS.with(|records| records.borrow_mut().clear());
    let result = f();
    let records = RECORDS.with(|records| records.take());

    (result, records)
}

/// Only the records at `level`.
pub(crate) fn at_level(records: &[(Level, String)], level: Level) -> Vec<&str> {
    records
        .iter()
        .filter(|(record_level, _)| *record_level == level)
        .map(|(_, message)| message.as_str())
        .collect()
}

fn dims(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Temperature on a Lambert conformal grid, modeled on NARR output: one time, three pressure
/// levels, a 4x5 projection grid in km, and 2-D lat/lon auxiliary coordinates.
///
pub(crate) fn narr_temperature() -> Variable {
    let values = ArrayD::from_shape_fn(IxDyn(&[1, 3, 4, 5]), |idx| {
        290.0 - 10.0 * idx[1] as f64 + idx[2] as f64 * 0.5 + idx[3] as f64 * 0.1
    });

    let lat = ArrayD::from_shape_fn(IxDyn(&[4, 5]), |idx| 30.0 + idx[0] as f64 * 0.1);
    let lon = ArrayD::from_shape_fn(IxDyn(&[4, 5]), |idx| -100.0 + idx[1] as f64 * 0.1);

    Variable::new("Temperature", dims(&["time", "isobaric", "y", "x"]), values)
        .unwrap()
        .with_attr("units", "K")
        .with_attr("grid_mapping", "LambertConformal_Projection")
        .with_coord(
            Coordinate::dimension("time", array![0.0])
                .with_attr("standard_name", "time")
                .with_attr("units", "hours since 1987-04-04 18:00:00"),
        )
        .with_coord(
            Coordinate::dimension("isobaric", array![1000.0, 850.0, 700.0]).with_attr("units", "hPa"),
        )
        .with_coord(
            Coordinate::range("y", 0.0, 10.0, 4)
                .with_attr("standard_name", "projection_y_coordinate")
                .with_attr("units", "km"),
        )
        .with_coord(
            Coordinate::range("x", 0.0, 10.0, 5)
                .with_attr("standard_name", "projection_x_coordinate")
                .with_attr("units", "km"),
        )
        .with_coord(
            Coordinate::new("lat", dims(&["y", "x"]), lat)
                .unwrap()
                .with_attr("units", "degrees_north"),
        )
        .with_coord(
            Coordinate::new("lon", dims(&["y", "x"]), lon)
                .unwrap()
                .with_attr("units", "degrees_east"),
        )
}

/// Two variables on the NARR grid, plus the grid mapping variable they refer to.
///
pub(crate) fn narr_dataset() -> Dataset {
    let temperature = narr_temperature();
    let mut u_wind = narr_temperature().with_attr("units", "m/s");
    u_wind.name = String::from("u_wind");
    u_wind.values.mapv_inplace(|value| value - 280.0);

    let projection = Variable::new("LambertConformal_Projection", vec![], ArrayD::zeros(IxDyn(&[])))
        .unwrap()
        .with_attr("grid_mapping_name", "lambert_conformal_conic")
        .with_attr("standard_parallel", "25.0")
        .with_attr("longitude_of_central_meridian", "265.0")
        .with_attr("latitude_of_projection_origin", "25.0");

    Dataset::new()
        .with_data_var(temperature)
        .with_data_var(u_wind)
        .with_variable(projection)
}

/// A single sounding: temperature in Celsius on five pressure levels.
///
pub(crate) fn pressure_profile() -> Variable {
    Variable::new(
        "air_temperature",
        dims(&["pressure"]),
        array![20.0, 12.0, 2.0, -15.0, -40.0].into_dyn(),
    )
    .unwrap()
    .with_attr("units", "degC")
    .with_coord(
        Coordinate::dimension("pressure", array![1000.0, 850.0, 700.0, 500.0, 300.0])
            .with_attr("standard_name", "air_pressure")
            .with_attr("units", "hPa"),
    )
}

/// Station data with two latitude coordinates and nothing to choose between them.
///
pub(crate) fn ambiguous_lat() -> Variable {
    let station = || ArrayD::from_shape_fn(IxDyn(&[3]), |idx| idx[0] as f64);

    Variable::new("precipitation", dims(&["station"]), ArrayD::zeros(IxDyn(&[3])))
        .unwrap()
        .with_coord(
            Coordinate::new("lat", dims(&["station"]), station())
                .unwrap()
                .with_attr("units", "degrees_north"),
        )
        .with_coord(
            Coordinate::new("latitude", dims(&["station"]), station())
                .unwrap()
                .with_attr("standard_name", "latitude"),
        )
        .with_coord(
            Coordinate::new("lon", dims(&["station"]), station())
                .unwrap()
                .with_attr("units", "degrees_east"),
        )
}
