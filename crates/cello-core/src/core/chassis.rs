use phf::phf_map;

/// User Constraint Files distributed with Cello v2, keyed by chassis name,
/// with the host organism each one targets.
pub static KNOWN_CHASSIS: phf::Map<&'static str, &'static str> = phf_map! {
    "Eco1C1G1T1" => "Escherichia coli",
    "Eco1C2G2T2" => "Escherichia coli",
    "Eco2C1G3T1" => "Escherichia coli",
    "Bth1C1G1T1" => "Bacteroides thetaiotaomicron",
    "SC1C1G1T1" => "Saccharomyces cerevisiae",
};

/// The three chassis-specific input files that Cello reads for one target organism.
///
/// Cello ships its constraint data as a triplet of JSON documents that share a
/// common stem: `<name>.UCF.json` (gates and parts), `<name>.input.json`
/// (input sensors) and `<name>.output.json` (output devices).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChassisFiles {
    /// The chassis name, e.g. `Eco1C1G1T1`.
    pub name: String,
    /// File name of the User Constraint File.
    pub ucf: String,
    /// File name of the input sensor library.
    pub input_sensors: String,
    /// File name of the output device library.
    pub output_device: String,
}

impl ChassisFiles {
    /// Derives the conventional file names for a chassis.
    ///
    /// # Arguments
    ///
    /// * `name` - The chassis name, without any extension.
    ///
    /// # Return
    ///
    /// Returns the file triplet. Existence of the files is not checked here.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            ucf: format!("{name}.UCF.json"),
            input_sensors: format!("{name}.input.json"),
            output_device: format!("{name}.output.json"),
            name,
        }
    }

    /// Returns `true` if the chassis is one of the UCFs distributed with Cello v2.
    pub fn is_known(&self) -> bool {
        KNOWN_CHASSIS.contains_key(self.name.as_str())
    }

    /// Returns the host organism of a known chassis.
    pub fn organism(&self) -> Option<&'static str> {
        KNOWN_CHASSIS.get(self.name.as_str()).copied()
    }
}

/// Lists the known chassis names in a stable, sorted order.
pub fn known_chassis_names() -> Vec<&'static str> {
    let mut names: Vec<_> = KNOWN_CHASSIS.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_the_ucf_convention() {
        let chassis = ChassisFiles::new("Eco1C2G2T2");
        assert_eq!(chassis.ucf, "Eco1C2G2T2.UCF.json");
        assert_eq!(chassis.input_sensors, "Eco1C2G2T2.input.json");
        assert_eq!(chassis.output_device, "Eco1C2G2T2.output.json");
    }

    #[test]
    fn known_chassis_report_their_organism() {
        assert_eq!(
            ChassisFiles::new("SC1C1G1T1").organism(),
            Some("Saccharomyces cerevisiae")
        );
        let custom = ChassisFiles::new("MyLab1C1G1T1");
        assert!(!custom.is_known());
        assert_eq!(custom.organism(), None);
    }

    #[test]
    fn known_chassis_names_are_sorted() {
        let names = known_chassis_names();
        assert_eq!(names.len(), KNOWN_CHASSIS.len());
        assert_eq!(names.first(), Some(&"Bth1C1G1T1"));
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }
}
