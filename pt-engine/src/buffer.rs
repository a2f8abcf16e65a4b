use std::sync::Arc;

use vulkano::{
    buffer::{Buffer, BufferContents, BufferCreateInfo, BufferUsage, Subbuffer},
    command_buffer::{
        allocator::CommandBufferAllocator, AutoCommandBufferBuilder, CommandBufferExecFuture,
        CommandBufferUsage, CopyBufferInfo,
    },
    device::Queue,
    memory::allocator::{AllocationCreateInfo, MemoryAllocator, MemoryTypeFilter},
    sync::{self, future::FenceSignalFuture, GpuFuture},
};

/// The future type for sending a buffer to the device.
pub type SendBufferFuture = FenceSignalFuture<CommandBufferExecFuture<sync::future::NowFuture>>;

#[must_use = "The function returns a future that must be awaited and a buffer that must be used"]
/// Sends the given data to a device-local buffer through a staging buffer,
/// returning the destination buffer and the transfer future.
pub fn send_to_device<T, I>(
    memory_allocator: &Arc<dyn MemoryAllocator>,
    command_buffer_allocator: &Arc<dyn CommandBufferAllocator>,
    queue: &Arc<Queue>,
    usage: BufferUsage,
    data: I,
) -> crate::Result<(Subbuffer<[T]>, SendBufferFuture)>
where
    T: BufferContents,
    I: IntoIterator<Item = T>,
    I::IntoIter: ExactSizeIterator,
{
    let staging_buffer = Buffer::from_iter(
        memory_allocator.clone(),
        BufferCreateInfo {
            usage: BufferUsage::TRANSFER_SRC,
            ..Default::default()
        },
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_HOST
                | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
            ..Default::default()
        },
        data,
    )?;

    let destination_buffer = Buffer::new_slice::<T>(
        memory_allocator.clone(),
        BufferCreateInfo {
            usage: usage | BufferUsage::TRANSFER_DST,
            ..Default::default()
        },
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_DEVICE,
            ..Default::default()
        },
        staging_buffer.len(),
    )?;

    let mut builder = AutoCommandBufferBuilder::primary(
        command_buffer_allocator.clone(),
        queue.queue_family_index(),
        CommandBufferUsage::OneTimeSubmit,
    )?;
    builder.copy_buffer(CopyBufferInfo::buffers(
        staging_buffer,
        destination_buffer.clone(),
    ))?;
    let command_buffer = builder.build()?;

    let future = sync::now(queue.device().clone())
        .then_execute(queue.clone(), command_buffer)?
        .then_signal_fence_and_flush()?;

    Ok((destination_buffer, future))
}

#[cfg(feature = "image")]
#[must_use = "The function returns a buffer that must be used"]
/// Creates a host-readable buffer, target of device to host copies.
pub fn new_readback<T>(
    memory_allocator: &Arc<dyn MemoryAllocator>,
    len: u64,
) -> crate::Result<Subbuffer<[T]>>
where
    T: BufferContents,
{
    Ok(Buffer::new_slice::<T>(
        memory_allocator.clone(),
        BufferCreateInfo {
            usage: BufferUsage::TRANSFER_DST,
            ..Default::default()
        },
        AllocationCreateInfo {
            memory_type_filter: MemoryTypeFilter::PREFER_HOST
                | MemoryTypeFilter::HOST_RANDOM_ACCESS,
            ..Default::default()
        },
        len,
    )?)
}
