//! Logical completion events and their mapping to engine event ids.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hardware completion events a block can wait on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompEvent {
    Rdma0Done,
    Wrot0Done,
    Wdma0Done,
    /// ISP pass-2 done for one completion-queue thread.
    IspP2Done(u8),
}

/// Engine event ids, normally taken from the board description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTable {
    pub rdma0_done: u16,
    pub wrot0_done: u16,
    pub wdma0_done: u16,
    /// Indexed by completion-queue thread.
    pub isp_p2_done: Vec<u16>,
}

impl EventTable {
    pub fn id(&self, event: CompEvent) -> Result<u16> {
        match event {
            CompEvent::Rdma0Done => Ok(self.rdma0_done),
            CompEvent::Wrot0Done => Ok(self.wrot0_done),
            CompEvent::Wdma0Done => Ok(self.wdma0_done),
            CompEvent::IspP2Done(thread) => {
                self.isp_p2_done.get(thread as usize).copied().ok_or_else(|| {
                    Error::invalid(format!("no event id for ISP P2 thread {thread}"))
                })
            }
        }
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self {
            rdma0_done: 14,
            wrot0_done: 19,
            wdma0_done: 20,
            isp_p2_done: (129..141).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_all_cq_threads() {
        let table = EventTable::default();
        assert_eq!(table.isp_p2_done.len(), 12);
        assert_eq!(table.id(CompEvent::IspP2Done(0)).unwrap(), 129);
        assert_eq!(table.id(CompEvent::IspP2Done(11)).unwrap(), 140);
    }

    #[test]
    fn test_missing_thread_is_invalid() {
        let table = EventTable::default();
        assert!(matches!(
            table.id(CompEvent::IspP2Done(12)),
            Err(Error::InvalidParameter(_))
        ));
    }
}
