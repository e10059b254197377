//! XML scenario report written by IoD Sim at the end of a run.
//!
//! Only the parts used by the analysis commands are decoded: entity
//! addresses, positions, packet transfers and RSSI samples.

pub mod xml;

use crate::prelude::{AnalysisError, AnalysisResult, Point3, PositionSample};
use roxmltree::{Document, Node};
use serde::Serialize;
use std::fs;
use std::path::Path;
use xml::{attribute, find_all, optional_value_at, text_at, value_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Zsp,
    Drone,
}

/// A packet recorded by an entity's application layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub time_ns: Option<i64>,
    pub direction: Option<String>,
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RssiSample {
    pub from: String,
    pub value_dbm: f64,
    pub time_ns: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntity {
    pub kind: EntityKind,
    pub address: String,
    pub positions: Vec<PositionSample>,
    pub data_rx: Vec<Transfer>,
    pub data_tx: Vec<Transfer>,
    pub rssi: Vec<RssiSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub executed_at: String,
    pub zsps: Vec<ReportEntity>,
    pub drones: Vec<ReportEntity>,
}

impl ScenarioReport {
    pub fn load(path: &Path) -> AnalysisResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| AnalysisError::io(path, err))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> AnalysisResult<Self> {
        let doc = Document::parse(text).map_err(|err| AnalysisError::Xml(err.to_string()))?;
        let root = doc.root_element();

        let scenario = root.attribute("scenario").unwrap_or("unnamed").to_string();
        let executed_at = root.attribute("executedAt").unwrap_or_default().to_string();

        let zsps = find_all(root, "zsps/zsp")
            .into_iter()
            .map(parse_zsp)
            .collect::<AnalysisResult<Vec<_>>>()?;
        let drones = find_all(root, "drones/drone")
            .into_iter()
            .map(parse_drone)
            .collect::<AnalysisResult<Vec<_>>>()?;

        Ok(Self {
            scenario,
            executed_at,
            zsps,
            drones,
        })
    }

    /// One-line summary of the scenario and its execution time.
    pub fn banner(&self) -> String {
        let when = self
            .executed_at
            .split_once('.')
            .and_then(|(date, time)| {
                let parts: Vec<&str> = time.split('-').collect();
                (parts.len() == 3).then(|| format!("{} at {}", date, parts.join(":")))
            })
            .unwrap_or_else(|| self.executed_at.clone());
        format!("Analysing Scenario {} started in {}", self.scenario, when)
    }

    /// ZSPs first, then drones.
    pub fn entities(&self) -> impl Iterator<Item = &ReportEntity> {
        self.zsps.iter().chain(self.drones.iter())
    }
}

fn parse_zsp(node: Node<'_, '_>) -> AnalysisResult<ReportEntity> {
    Ok(ReportEntity {
        kind: EntityKind::Zsp,
        address: text_at(node, "stack/ipv4/address")?,
        positions: parse_positions(node, "position")?,
        data_rx: parse_transfers(node, "dataRx/transfer")?,
        data_tx: parse_transfers(node, "dataTx/transfer")?,
        rssi: Vec::new(),
    })
}

fn parse_drone(node: Node<'_, '_>) -> AnalysisResult<ReportEntity> {
    let rssi = find_all(node, "networkStacks/stack/phy/signal/rssi")
        .into_iter()
        .map(|s| {
            Ok(RssiSample {
                from: attribute(s, "from")?,
                value_dbm: attribute(s, "value")?,
                time_ns: attribute(s, "time")?,
            })
        })
        .collect::<AnalysisResult<Vec<_>>>()?;

    Ok(ReportEntity {
        kind: EntityKind::Drone,
        address: text_at(node, "networkStacks/stack/ipv4/address")?,
        positions: parse_positions(node, "trajectory/position")?,
        data_rx: parse_transfers(node, "dataRx/transfer")?,
        data_tx: parse_transfers(node, "dataTx/transfer")?,
        rssi,
    })
}

fn parse_positions(node: Node<'_, '_>, path: &str) -> AnalysisResult<Vec<PositionSample>> {
    find_all(node, path)
        .into_iter()
        .map(|p| {
            Ok(PositionSample {
                t_ns: value_at(p, "t")?,
                point: Point3::new(value_at(p, "x")?, value_at(p, "y")?, value_at(p, "z")?),
            })
        })
        .collect()
}

fn parse_transfers(node: Node<'_, '_>, path: &str) -> AnalysisResult<Vec<Transfer>> {
    find_all(node, path)
        .into_iter()
        .map(|t| {
            Ok(Transfer {
                time_ns: optional_value_at(t, "time")?,
                direction: text_at(t, "direction").ok(),
                source: text_at(t, "sourceAddress")?,
                destination: text_at(t, "destinationAddress")?,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const REPORT: &str = r#"<?xml version="1.0"?>
<simulation scenario="paper_1" executedAt="2021-03-04.12-30-05">
  <zsps>
    <zsp>
      <position><x>0</x><y>0</y><z>0</z><t>0</t></position>
      <stack><ipv4 broadcast="10.1.1.255"><address>10.1.1.1</address></ipv4></stack>
      <dataRx>
        <transfer><time>1000</time><direction>RX</direction><sourceAddress>10.1.1.2</sourceAddress><destinationAddress>10.1.1.1</destinationAddress></transfer>
        <transfer><time>3000</time><direction>RX</direction><sourceAddress>10.1.1.2</sourceAddress><destinationAddress>10.1.1.1</destinationAddress></transfer>
        <transfer><time>5000</time><direction>RX</direction><sourceAddress>10.1.1.2</sourceAddress><destinationAddress>10.1.1.1</destinationAddress></transfer>
      </dataRx>
      <dataTx>
        <transfer><time>1500</time><direction>TX</direction><sourceAddress>10.1.1.1</sourceAddress><destinationAddress>10.1.1.2</destinationAddress></transfer>
        <transfer><time>3500</time><direction>TX</direction><sourceAddress>10.1.1.1</sourceAddress><destinationAddress>10.1.1.2</destinationAddress></transfer>
      </dataTx>
    </zsp>
  </zsps>
  <drones>
    <drone>
      <trajectory>
        <position><x>3</x><y>4</y><z>0</z><t>2000</t></position>
        <position><x>6</x><y>8</y><z>0</z><t>4000</t></position>
        <position><x>6</x><y>8</y><z>0</z><t>4500</t></position>
        <position><x>0</x><y>0</y><z>5</z><t>6000</t></position>
      </trajectory>
      <networkStacks>
        <stack>
          <ipv4><address>10.1.1.2</address></ipv4>
          <phy>
            <signal>
              <rssi from="10.1.1.1" value="-60.5" time="1000000000"/>
              <rssi from="10.1.1.1" value="-62.0" time="2000000000"/>
            </signal>
          </phy>
        </stack>
      </networkStacks>
      <dataRx>
        <transfer><time>2500</time><direction>RX</direction><sourceAddress>10.1.1.1</sourceAddress><destinationAddress>10.1.1.2</destinationAddress></transfer>
      </dataRx>
      <dataTx>
        <transfer><time>900</time><direction>TX</direction><sourceAddress>10.1.1.2</sourceAddress><destinationAddress>10.1.1.1</destinationAddress></transfer>
        <transfer><time>2900</time><direction>TX</direction><sourceAddress>10.1.1.2</sourceAddress><destinationAddress>10.1.1.1</destinationAddress></transfer>
        <transfer><time>4900</time><direction>TX</direction><sourceAddress>10.1.1.2</sourceAddress><destinationAddress>10.1.1.1</destinationAddress></transfer>
        <transfer><time>5900</time><direction>TX</direction><sourceAddress>10.1.1.2</sourceAddress><destinationAddress>10.1.1.1</destinationAddress></transfer>
      </dataTx>
    </drone>
  </drones>
</simulation>
"#;
}
