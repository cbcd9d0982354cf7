//! Linear copy primitive for rank-1 normalized problems.

/// Copy `len` bytes starting at byte `offset` of both buffers.
///
/// # Safety
/// `src` must be readable and `dst` writable for `offset + len` bytes, and the
/// two regions must not overlap.
#[inline]
pub unsafe fn copy_bytes(src: *const u8, dst: *mut u8, offset: usize, len: usize) {
    std::ptr::copy_nonoverlapping(src.add(offset), dst.add(offset), len);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_window() {
        let src: Vec<u8> = (0..32).collect();
        let mut dst = vec![0u8; 32];
        unsafe { copy_bytes(src.as_ptr(), dst.as_mut_ptr(), 8, 16) };
        assert!(dst[..8].iter().all(|&b| b == 0));
        assert_eq!(&dst[8..24], &src[8..24]);
        assert!(dst[24..].iter().all(|&b| b == 0));
    }
}
