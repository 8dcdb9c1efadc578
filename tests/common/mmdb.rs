//! Minimal MaxMind DB writer for tests
//!
//! Produces IPv6 databases with 24-bit records. IPv4 networks are stored
//! under ::/96, which is where readers look them up.

use std::net::IpAddr;
use std::path::Path;

const METADATA_MARKER: &[u8] = b"\xAB\xCD\xEFMaxMind.com";
const DATA_SECTION_SEPARATOR: usize = 16;

/// Values of the MaxMind DB data section
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    U16(u16),
    U32(u32),
    U64(u64),
    Map(Vec<(String, Value)>),
    Array(Vec<Value>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(s.to_string())
    }

    pub fn map(entries: Vec<(&str, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

#[derive(Debug, Clone, Copy)]
enum Record {
    Empty,
    Node(usize),
    Data(usize),
}

pub struct MmdbWriter {
    database_type: String,
    build_epoch: u64,
    nodes: Vec<[Record; 2]>,
    data: Vec<u8>,
}

impl MmdbWriter {
    pub fn new(database_type: &str) -> Self {
        Self {
            database_type: database_type.to_string(),
            build_epoch: 1_700_000_000,
            nodes: vec![[Record::Empty, Record::Empty]],
            data: Vec::new(),
        }
    }

    pub fn build_epoch(mut self, epoch: u64) -> Self {
        self.build_epoch = epoch;
        self
    }

    /// Map `cidr` to `{"country": {"iso_code": code}}`
    pub fn insert_country(&mut self, cidr: &str, code: &str) -> &mut Self {
        let record = Value::map(vec![(
            "country",
            Value::map(vec![("iso_code", Value::str(code))]),
        )]);
        self.insert(cidr, &record)
    }

    /// Map `cidr` to a record without any country
    pub fn insert_without_country(&mut self, cidr: &str) -> &mut Self {
        let record = Value::map(vec![(
            "continent",
            Value::map(vec![("code", Value::str("EU"))]),
        )]);
        self.insert(cidr, &record)
    }

    pub fn insert(&mut self, cidr: &str, record: &Value) -> &mut Self {
        let (bits, prefix) = network_bits(cidr);
        let offset = self.data.len();
        encode(record, &mut self.data);

        let mut node = 0;
        for (i, bit) in bits.iter().take(prefix).enumerate() {
            let side = usize::from(*bit);
            if i + 1 == prefix {
                self.nodes[node][side] = Record::Data(offset);
                break;
            }
            node = match self.nodes[node][side] {
                Record::Node(next) => next,
                inherited => {
                    // Split: both halves keep whatever the wider record held.
                    let next = self.nodes.len();
                    self.nodes.push([inherited, inherited]);
                    self.nodes[node][side] = Record::Node(next);
                    next
                }
            };
        }
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let node_count = self.nodes.len();
        let mut out = Vec::with_capacity(node_count * 6 + DATA_SECTION_SEPARATOR + self.data.len());

        for node in &self.nodes {
            for record in node {
                let value = match *record {
                    Record::Empty => node_count,
                    Record::Node(n) => n,
                    Record::Data(off) => node_count + DATA_SECTION_SEPARATOR + off,
                };
                out.extend_from_slice(&(value as u32).to_be_bytes()[1..]);
            }
        }
        out.extend_from_slice(&[0u8; DATA_SECTION_SEPARATOR]);
        out.extend_from_slice(&self.data);

        out.extend_from_slice(METADATA_MARKER);
        let metadata = Value::map(vec![
            ("binary_format_major_version", Value::U16(2)),
            ("binary_format_minor_version", Value::U16(0)),
            ("build_epoch", Value::U64(self.build_epoch)),
            ("database_type", Value::str(&self.database_type)),
            (
                "description",
                Value::map(vec![("en", Value::str("geofence test database"))]),
            ),
            ("ip_version", Value::U16(6)),
            ("languages", Value::Array(vec![Value::str("en")])),
            ("node_count", Value::U32(node_count as u32)),
            ("record_size", Value::U16(24)),
        ]);
        encode(&metadata, &mut out);
        out
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).expect("failed to write test mmdb");
    }
}

fn network_bits(cidr: &str) -> (Vec<bool>, usize) {
    let (addr, len) = cidr.split_once('/').expect("cidr needs a prefix length");
    let len: usize = len.parse().expect("bad prefix length");
    let ip: IpAddr = addr.parse().expect("bad network address");

    let (bytes, prefix) = match ip {
        IpAddr::V4(v4) => (v4.to_ipv6_compatible().octets(), 96 + len),
        IpAddr::V6(v6) => (v6.octets(), len),
    };
    let bits = bytes
        .iter()
        .flat_map(|b| (0..8).rev().map(move |i| (b >> i) & 1 == 1))
        .collect();
    (bits, prefix)
}

const TYPE_STRING: u8 = 2;
const TYPE_UINT16: u8 = 5;
const TYPE_UINT32: u8 = 6;
const TYPE_MAP: u8 = 7;
const TYPE_UINT64: u8 = 9;
const TYPE_ARRAY: u8 = 11;

fn encode(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Str(s) => {
            control(TYPE_STRING, s.len(), out);
            out.extend_from_slice(s.as_bytes());
        }
        Value::U16(n) => uint(TYPE_UINT16, u64::from(*n), out),
        Value::U32(n) => uint(TYPE_UINT32, u64::from(*n), out),
        Value::U64(n) => uint(TYPE_UINT64, *n, out),
        Value::Map(entries) => {
            control(TYPE_MAP, entries.len(), out);
            for (k, v) in entries {
                encode(&Value::Str(k.clone()), out);
                encode(v, out);
            }
        }
        Value::Array(items) => {
            control(TYPE_ARRAY, items.len(), out);
            for item in items {
                encode(item, out);
            }
        }
    }
}

fn uint(type_num: u8, n: u64, out: &mut Vec<u8>) {
    let bytes = n.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    control(type_num, bytes.len() - skip, out);
    out.extend_from_slice(&bytes[skip..]);
}

fn control(type_num: u8, size: usize, out: &mut Vec<u8>) {
    let (size_bits, extra): (u8, Vec<u8>) = match size {
        0..=28 => (size as u8, vec![]),
        29..=284 => (29, vec![(size - 29) as u8]),
        285..=65_820 => (30, ((size - 285) as u16).to_be_bytes().to_vec()),
        _ => (31, ((size - 65_821) as u32).to_be_bytes()[1..].to_vec()),
    };

    if type_num <= 7 {
        out.push((type_num << 5) | size_bits);
    } else {
        out.push(size_bits);
        out.push(type_num - 7);
    }
    out.extend_from_slice(&extra);
}
