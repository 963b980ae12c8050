use std::env;

use inquire::{Confirm, CustomType, Select, Text};
use mercury_ips::{
    Axis, Backend, Coordinate, FieldVector, MercuryIpsBuilder, RampMode, psu::PsuState,
};

// Configuration constants - adjust these for your setup
const DEFAULT_RESOURCE: &str = "TCPIP0::192.168.0.10::7020::SOCKET";
// Keep the demo inside a 1 T ball.
const MAX_FIELD_T: f64 = 1.0;
const RAMP_RATE_T_PER_S: f64 = 0.005;
const SIMULATOR: &str = "Simulated instrument";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt::init();

    // Get the resource from command line arg or interactive selection
    let resource = env::args().nth(1).unwrap_or_else(|| {
        let choice = Select::new(
            "Select an instrument:",
            vec![SIMULATOR.to_owned(), "Mercury iPS over TCP".to_owned()],
        )
        .prompt()
        .expect("Failed to select instrument");

        if choice == SIMULATOR {
            return choice;
        }
        Text::new("VISA resource name:")
            .with_default(DEFAULT_RESOURCE)
            .prompt()
            .expect("Failed to read resource name")
    });

    let backend = if resource == SIMULATOR {
        Backend::Simulation
    } else {
        Backend::Socket
    };
    println!("Using: {}", resource);

    let mut magnet = MercuryIpsBuilder::new()
        .with_backend(backend)
        .with_field_limits(|x, y, z| (x * x + y * y + z * z).sqrt() <= MAX_FIELD_T)
        .connect(&resource)
        .expect("Failed to connect to the instrument");

    println!("Connected to: {}", magnet.identity());

    // Measure and display the field
    let field = magnet.read_field().expect("Failed to read the field");
    println!("Measured field: {}", field);
    println!(
        "  r = {:.4} T, theta = {:.4} rad, phi = {:.4} rad",
        field.r(),
        field.theta(),
        field.phi()
    );

    for axis in Axis::ALL {
        let mut psu = magnet.psu(axis);
        let voltage = psu.read_voltage().expect("Failed to read voltage");
        let current = psu.read_current().expect("Failed to read current");
        let status = psu.get_ramp_status().expect("Failed to read ramp status");
        println!(
            "{}: {:.4} V, {:.4} A, {}",
            psu.uid(),
            voltage,
            current,
            status
        );
    }

    let ramp = Confirm::new("Ramp to a new field?")
        .with_default(false)
        .prompt()
        .expect("Failed to read answer");
    if !ramp {
        return;
    }

    let r: f64 = CustomType::new("Field magnitude r in T:")
        .with_default(0.1)
        .prompt()
        .expect("Failed to read r");
    let theta: f64 = CustomType::new("Polar angle theta in rad:")
        .with_default(0.0)
        .prompt()
        .expect("Failed to read theta");
    let phi: f64 = CustomType::new("Azimuth phi in rad:")
        .with_default(0.0)
        .prompt()
        .expect("Failed to read phi");

    magnet
        .set_field_ramp_rate(FieldVector::new(
            RAMP_RATE_T_PER_S,
            RAMP_RATE_T_PER_S,
            RAMP_RATE_T_PER_S,
        ))
        .expect("Failed to set ramp rates");

    if let Err(e) = magnet.set_field_target(FieldVector::spherical(r, theta, phi)) {
        eprintln!("Target refused: {}", e);
        std::process::exit(1);
    }
    println!("New target: {}", magnet.get_field_target());

    magnet
        .ramp(RampMode::Safe)
        .await
        .expect("Failed to ramp");

    let field = magnet.read_field().expect("Failed to read the field");
    println!("Measured field: {}", field);
    println!(
        "Measured r: {:.4} T",
        magnet
            .read_component(Coordinate::R)
            .expect("Failed to read r")
    );

    for axis in Axis::ALL {
        let state: &PsuState = magnet.psu_state(axis);
        println!("{}: {:?}", state.uid(), state.ramp_status());
    }
}
