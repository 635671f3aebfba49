use crate::error::Result;
use celloapi::{ChassisFiles, known_chassis_names};

pub fn run() -> Result<()> {
    println!("{:<12} {:<30} Files", "Chassis", "Organism");
    for name in known_chassis_names() {
        let chassis = ChassisFiles::new(name);
        println!(
            "{:<12} {:<30} {}, {}, {}",
            chassis.name,
            chassis.organism().unwrap_or("unknown"),
            chassis.ucf,
            chassis.input_sensors,
            chassis.output_device
        );
    }
    Ok(())
}
