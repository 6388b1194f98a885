// UEFI Device Path Protocol - just enough to classify a handle's terminal node

pub const EFI_DEVICE_PATH_PROTOCOL_GUID: [u8; 16] = [
    0x91, 0x6e, 0x57, 0x09, 0x3f, 0x6d, 0xd2, 0x11, 0x8e, 0x39, 0x00, 0xa0, 0xc9, 0x69, 0x72, 0x3b,
];

/// Media device path node type.
pub const TYPE_MEDIA_DEVICE_PATH: u8 = 0x04;
/// CD-ROM "El Torito" media sub-type.
pub const SUBTYPE_CDROM: u8 = 0x02;
/// End-of-path node type.
pub const TYPE_END_DEVICE_PATH: u8 = 0x7f;

/// Generic device path node header. Every node starts with this; `length`
/// covers the header plus the node-specific payload.
#[repr(C)]
pub struct DevicePathNode {
    pub node_type: u8,
    pub sub_type: u8,
    pub length: [u8; 2],
}

impl DevicePathNode {
    pub fn length(&self) -> u16 {
        u16::from_le_bytes(self.length)
    }

    pub fn is_end(&self) -> bool {
        self.node_type == TYPE_END_DEVICE_PATH
    }

    /// Whether this node describes CD-ROM media. A block-I/O handle whose
    /// terminal node is a CD-ROM node is a boot-image view of an optical
    /// medium, not a distinct disk.
    pub fn is_cdrom_media(&self) -> bool {
        self.node_type == TYPE_MEDIA_DEVICE_PATH && self.sub_type == SUBTYPE_CDROM
    }
}

/// Walk to the last node before the end-of-path marker.
///
/// # Safety
/// `path` must point at a well-formed, end-terminated device path owned by
/// firmware for the duration of the call.
pub unsafe fn terminal_node(path: *const DevicePathNode) -> *const DevicePathNode {
    let mut node = path;

    loop {
        let len = (*node).length() as usize;
        // A node shorter than its own header means the path is corrupt;
        // stop walking rather than loop forever.
        if len < core::mem::size_of::<DevicePathNode>() {
            return node;
        }

        let next = (node as *const u8).add(len) as *const DevicePathNode;
        if (*next).is_end() {
            return node;
        }
        node = next;
    }
}
