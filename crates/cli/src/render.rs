//! Minimal result rendering
//!
//! Compact single-purpose summaries of the structures this tool understands,
//! plus a hex dump for everything else. Full pretty-printing of every page
//! layout is deliberately not attempted; `--data-output` exports the raw
//! bytes for richer tooling.

use protocol::CommandDescriptor;
use protocol::sizing::{
    ERROR_LOG_ENTRY_SIZE, FDP_EVENT_SIZE, FDP_EVENTS_HEADER_SIZE, RUHS_DESC_SIZE,
    RUHS_HEADER_SIZE, RUHU_DESC_SIZE, RUHU_HEADER_SIZE,
};

fn read_u32(raw: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&raw[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn read_u64(raw: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&raw[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

fn ascii_field(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

/// Hex dump, 16 bytes per line
pub fn hexdump(raw: &[u8]) {
    for (i, chunk) in raw.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("{:08x}: {}", i * 16, hex.join(" "));
    }
}

/// Summarize an identify-namespace structure
pub fn identify_ns(raw: &[u8]) {
    println!("identify-namespace:");
    println!("  nsze: 0x{:x}", read_u64(raw, 0));
    println!("  ncap: 0x{:x}", read_u64(raw, 8));
    println!("  nuse: 0x{:x}", read_u64(raw, 16));
    println!("  nlbaf: {}", raw[25]);
    println!("  flbas: 0x{:x}", raw[26]);
}

/// Summarize an identify-controller structure
pub fn identify_ctrlr(raw: &[u8]) {
    println!("identify-controller:");
    println!("  vid: 0x{:04x}", u16::from_le_bytes([raw[0], raw[1]]));
    println!("  sn: '{}'", ascii_field(&raw[4..24]));
    println!("  mn: '{}'", ascii_field(&raw[24..64]));
    println!("  fr: '{}'", ascii_field(&raw[64..72]));
    println!("  elpe: {}", raw[262]);
}

/// Summarize an identify-command-set structure
pub fn identify_cs(raw: &[u8]) {
    println!("identify-command-set:");
    for (i, chunk) in raw.chunks_exact(8).take(8).enumerate() {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        println!("  iocsc[{}]: 0x{:016x}", i, u64::from_le_bytes(bytes));
    }
}

/// Summarize a SMART / health log page
pub fn health_log(raw: &[u8]) {
    println!("health-log:");
    println!("  critical_warning: 0x{:x}", raw[0]);
    println!(
        "  composite_temperature: {}",
        u16::from_le_bytes([raw[1], raw[2]])
    );
    println!("  available_spare: {}%", raw[3]);
    println!("  percentage_used: {}%", raw[5]);
}

/// Render error-information log entries
pub fn error_log(raw: &[u8], entries: u32) {
    println!("# {entries} error log page entries:");
    for (i, entry) in raw
        .chunks_exact(ERROR_LOG_ENTRY_SIZE)
        .take(entries as usize)
        .enumerate()
    {
        println!(
            "  - {{slot: {}, error_count: {}, sqid: {}, cid: 0x{:04x}, status: 0x{:04x}}}",
            i,
            read_u64(entry, 0),
            u16::from_le_bytes([entry[8], entry[9]]),
            u16::from_le_bytes([entry[10], entry[11]]),
            u16::from_le_bytes([entry[12], entry[13]]),
        );
    }
}

/// Render reclaim-unit-handle usage descriptors
pub fn ruhu_log(raw: &[u8], entries: u32) {
    println!("# {entries} reclaim unit handle usage:");
    let descs = &raw[RUHU_HEADER_SIZE..];
    for (i, desc) in descs
        .chunks_exact(RUHU_DESC_SIZE)
        .take(entries as usize)
        .enumerate()
    {
        println!("  - {{ruhid: {}, ruha: 0x{:x}}}", i, desc[0]);
    }
}

/// Render the FDP statistics log
pub fn fdp_stats_log(raw: &[u8]) {
    println!("fdp-stats:");
    println!("  hbmw: 0x{:x}", read_u64(raw, 0));
    println!("  mbmw: 0x{:x}", read_u64(raw, 16));
    println!("  mbe: 0x{:x}", read_u64(raw, 32));
}

/// Render FDP event log entries
pub fn fdp_events_log(raw: &[u8], entries: u32) {
    println!("# {entries} fdp events log page entries:");
    println!("  nevents: {}", read_u32(raw, 0));
    let events = &raw[FDP_EVENTS_HEADER_SIZE..];
    for event in events.chunks_exact(FDP_EVENT_SIZE).take(entries as usize) {
        println!(
            "  - {{type: 0x{:02x}, flags: 0x{:02x}, pid: 0x{:04x}, nsid: 0x{:x}}}",
            event[0],
            event[1],
            u16::from_le_bytes([event[2], event[3]]),
            read_u32(event, 12),
        );
    }
}

/// Render reclaim-unit-handle status descriptors
pub fn ruhs(raw: &[u8], entries: u32) {
    println!("# {entries} reclaim unit handle status:");
    println!(
        "  nruhsd: {}",
        u16::from_le_bytes([raw[14], raw[15]])
    );
    let descs = &raw[RUHS_HEADER_SIZE..];
    for desc in descs.chunks_exact(RUHS_DESC_SIZE).take(entries as usize) {
        println!(
            "  - {{pid: 0x{:04x}, ruhid: 0x{:04x}, earutr: {}, ruamw: 0x{:x}}}",
            u16::from_le_bytes([desc[0], desc[1]]),
            u16::from_le_bytes([desc[2], desc[3]]),
            read_u32(desc, 4),
            read_u64(desc, 8),
        );
    }
}

/// Render a command descriptor before passthrough submission
pub fn descriptor(cmd: &CommandDescriptor) {
    println!("descriptor:");
    println!("  opcode: 0x{:02x}", cmd.opcode);
    println!("  nsid: 0x{:x}", cmd.nsid);
    for (i, dw) in [cmd.cdw10, cmd.cdw11, cmd.cdw12, cmd.cdw13, cmd.cdw14, cmd.cdw15]
        .iter()
        .enumerate()
    {
        println!("  cdw{}: 0x{:08x}", i + 10, dw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::sizing::{HEALTH_LOG_SIZE, IDENTIFY_SIZE};

    #[test]
    fn test_renderers_accept_full_size_buffers() {
        identify_ns(&vec![0u8; IDENTIFY_SIZE]);
        identify_ctrlr(&vec![0u8; IDENTIFY_SIZE]);
        identify_cs(&vec![0u8; IDENTIFY_SIZE]);
        health_log(&vec![0u8; HEALTH_LOG_SIZE]);
        error_log(&vec![0u8; 2 * ERROR_LOG_ENTRY_SIZE], 2);
        ruhu_log(&vec![0u8; RUHU_HEADER_SIZE + RUHU_DESC_SIZE], 1);
        ruhs(&vec![0u8; RUHS_HEADER_SIZE + RUHS_DESC_SIZE], 1);
        fdp_stats_log(&vec![0u8; 64]);
        fdp_events_log(&vec![0u8; FDP_EVENTS_HEADER_SIZE + FDP_EVENT_SIZE], 1);
        hexdump(&[0u8; 33]);
    }
}
