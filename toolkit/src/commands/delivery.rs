use super::{output_path, write_rows};
use crate::plot::{Chart, Series};
use anyhow::Context;
use clap::Args;
use iodcore::metrics::{delivery_over_distance, delivery_ratios, rx_counts, tx_counts, FlowDelivery};
use iodcore::report::ScenarioReport;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct DeliveryArgs {
    /// XML report written at the end of a run
    pub report: PathBuf,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

fn load(path: &Path) -> anyhow::Result<ScenarioReport> {
    let report =
        ScenarioReport::load(path).with_context(|| format!("loading report {}", path.display()))?;
    println!("{}", report.banner());
    Ok(report)
}

/// PDR and PLR of every flow recorded in the report.
pub fn run(args: &DeliveryArgs) -> anyhow::Result<Vec<FlowDelivery>> {
    let report = load(&args.report)?;
    let flows = delivery_ratios(&rx_counts(&report), &tx_counts(&report));

    for flow in &flows {
        println!(
            "{} <- {}: PDR {:.2}% PLR {:.2}%",
            flow.from, flow.to, flow.pdr, flow.plr
        );
    }

    write_rows(&output_path(&args.out_dir, "delivery.csv")?, &flows)?;

    let categories: Vec<String> = flows
        .iter()
        .map(|f| format!("{} <- {}", f.from, f.to))
        .collect();
    let groups = vec![
        ("PDR".to_string(), flows.iter().map(|f| f.pdr).collect()),
        ("PLR".to_string(), flows.iter().map(|f| f.plr).collect()),
    ];
    Chart {
        path: &output_path(&args.out_dir, "delivery.svg")?,
        title: &report.scenario,
        x_desc: "flow",
        y_desc: "%",
    }
    .bars(&categories, &groups)?;

    Ok(flows)
}

#[derive(Serialize)]
struct DistanceRow<'a> {
    host: &'a str,
    distance: f64,
    pdr: f64,
}

/// PDR of every drone against its distance from the closest ZSP.
pub fn run_distance(args: &DeliveryArgs) -> anyhow::Result<()> {
    let report = load(&args.report)?;
    let curves = delivery_over_distance(&report);

    let rows = curves.iter().flat_map(|(host, points)| {
        points.iter().map(move |&(distance, pdr)| DistanceRow {
            host,
            distance,
            pdr,
        })
    });
    write_rows(&output_path(&args.out_dir, "delivery-distance.csv")?, rows)?;

    let series: Vec<Series> = curves
        .iter()
        .map(|(host, points)| Series::new(host.clone(), points.clone()))
        .collect();
    for s in &series {
        println!("{}: {} samples", s.name, s.points.len());
    }
    Chart {
        path: &output_path(&args.out_dir, "delivery-distance.svg")?,
        title: &report.scenario,
        x_desc: "distance from ZSP [m]",
        y_desc: "PDR [%]",
    }
    .lines(&series)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    pub(crate) const REPORT: &str = r#"<?xml version="1.0"?>
<simulation scenario="two-hop" executedAt="2023-03-01.10-20-30">
  <zsps>
    <zsp>
      <position><x>0</x><y>0</y><z>0</z><t>0</t></position>
      <stack><ipv4><address>10.1.0.1</address></ipv4></stack>
      <dataRx>
        <transfer><time>2000</time><sourceAddress>10.1.0.2</sourceAddress><destinationAddress>10.1.0.1</destinationAddress></transfer>
      </dataRx>
      <dataTx>
        <transfer><time>1000</time><sourceAddress>10.1.0.1</sourceAddress><destinationAddress>10.1.0.2</destinationAddress></transfer>
        <transfer><time>1500</time><sourceAddress>10.1.0.1</sourceAddress><destinationAddress>10.1.0.2</destinationAddress></transfer>
      </dataTx>
    </zsp>
  </zsps>
  <drones>
    <drone>
      <trajectory>
        <position><x>3</x><y>4</y><z>0</z><t>2500</t></position>
        <position><x>6</x><y>8</y><z>0</z><t>3000</t></position>
      </trajectory>
      <networkStacks>
        <stack>
          <ipv4><address>10.1.0.2</address></ipv4>
          <phy><signal>
            <rssi from="10.1.0.1" value="-60.5" time="1000000000"/>
            <rssi from="10.1.0.1" value="-61.0" time="2000000000"/>
          </signal></phy>
        </stack>
      </networkStacks>
      <dataRx>
        <transfer><time>1100</time><sourceAddress>10.1.0.1</sourceAddress><destinationAddress>10.1.0.2</destinationAddress></transfer>
      </dataRx>
      <dataTx>
        <transfer><time>1200</time><sourceAddress>10.1.0.2</sourceAddress><destinationAddress>10.1.0.1</destinationAddress></transfer>
        <transfer><time>1300</time><sourceAddress>10.1.0.2</sourceAddress><destinationAddress>10.1.0.1</destinationAddress></transfer>
      </dataTx>
    </drone>
  </drones>
</simulation>
"#;

    #[test]
    fn writes_flow_table_and_chart() {
        let dir = tempdir().unwrap();
        let report = dir.path().join("report.xml");
        fs::write(&report, REPORT).unwrap();
        let args = DeliveryArgs {
            report,
            out_dir: dir.path().join("out"),
        };

        let flows = run(&args).unwrap();
        assert_eq!(flows.len(), 2);
        assert!(flows.iter().all(|f| (f.pdr - 50.0).abs() < 1e-9));

        let csv = fs::read_to_string(dir.path().join("out/delivery.csv")).unwrap();
        assert!(csv.starts_with("from,to,pdr,plr\n"));
        assert!(dir.path().join("out/delivery.svg").exists());
    }

    #[test]
    fn distance_curve_per_drone() {
        let dir = tempdir().unwrap();
        let report = dir.path().join("report.xml");
        fs::write(&report, REPORT).unwrap();
        let args = DeliveryArgs {
            report,
            out_dir: dir.path().to_path_buf(),
        };

        run_distance(&args).unwrap();
        let csv = fs::read_to_string(dir.path().join("delivery-distance.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("host,distance,pdr"));
        assert!(lines.next().unwrap().starts_with("10.1.0.2,5"));
        assert!(dir.path().join("delivery-distance.svg").exists());
    }
}
