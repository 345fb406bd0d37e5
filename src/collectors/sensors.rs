struct SensorProbe {
    marker: &'static str,
    field: usize,
}

// Field positions match lm-sensors lines like "Package id 0:  +45.0°C  (high = +80.0°C)".
const SENSOR_PROBES: [SensorProbe; 4] = [
    SensorProbe {
        marker: "Package id 0",
        field: 3,
    },
    SensorProbe {
        marker: "Core 0",
        field: 2,
    },
    SensorProbe {
        marker: "Composite",
        field: 1,
    },
    SensorProbe {
        marker: "temp1",
        field: 1,
    },
];

impl SensorProbe {
    fn extract(&self, transcript: &str) -> Option<f64> {
        let line = transcript.lines().find(|line| line.contains(self.marker))?;
        let token = line.split_whitespace().nth(self.field)?;
        parse_reading(token)
    }
}

pub fn probe_chain(transcript: &str) -> Option<f64> {
    SENSOR_PROBES
        .iter()
        .find_map(|probe| probe.extract(transcript))
}

fn parse_reading(token: &str) -> Option<f64> {
    let token = token.strip_suffix("°C").unwrap_or(token);
    let token = token.strip_prefix('+').unwrap_or(token);
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TRANSCRIPT: &str = "\
coretemp-isa-0000
Adapter: ISA adapter
Package id 0:  +45.0°C  (high = +80.0°C, crit = +100.0°C)
Core 0:        +42.0°C  (high = +80.0°C, crit = +100.0°C)
Core 1:        +43.0°C  (high = +80.0°C, crit = +100.0°C)

nvme-pci-0400
Adapter: PCI adapter
Composite:    +38.9°C  (low  = -273.1°C, high = +81.8°C)

acpitz-acpi-0
Adapter: ACPI interface
temp1:        +27.8°C  (crit = +105.0°C)
";

    #[test]
    fn package_sensor_wins() {
        assert_eq!(probe_chain(FULL_TRANSCRIPT), Some(45.0));
    }

    #[test]
    fn falls_back_to_core_sensor() {
        let transcript = "\
Core 0:        +42.0°C  (high = +80.0°C)
Core 1:        +43.0°C  (high = +80.0°C)
";
        assert_eq!(probe_chain(transcript), Some(42.0));
    }

    #[test]
    fn falls_back_to_nvme_composite() {
        let transcript = "Composite:    +38.9°C  (low  = -273.1°C)\n";
        assert_eq!(probe_chain(transcript), Some(38.9));
    }

    #[test]
    fn falls_back_to_generic_temp1() {
        let transcript = "temp1:        +27.8°C  (crit = +105.0°C)\n";
        assert_eq!(probe_chain(transcript), Some(27.8));
    }

    #[test]
    fn unparseable_reading_moves_to_next_probe() {
        let transcript = "\
Package id 0:  N/A
Core 0:        +42.0°C  (high = +80.0°C)
";
        assert_eq!(probe_chain(transcript), Some(42.0));
    }

    #[test]
    fn empty_transcript_is_absent() {
        assert_eq!(probe_chain(""), None);
        assert_eq!(probe_chain("Adapter: ISA adapter\n"), None);
    }

    #[test]
    fn reading_is_stripped_before_parse() {
        assert_eq!(parse_reading("+45.0°C"), Some(45.0));
        assert_eq!(parse_reading("45.0"), Some(45.0));
        assert_eq!(parse_reading("-5.2°C"), Some(-5.2));
        assert_eq!(parse_reading("°C"), None);
        assert_eq!(parse_reading("abc"), None);
    }

    #[test]
    fn only_first_matching_line_is_scanned() {
        let transcript = "\
Core 0:        +42.0°C
Core 0:        +99.0°C
";
        assert_eq!(probe_chain(transcript), Some(42.0));
    }
}
